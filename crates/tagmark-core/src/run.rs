//! Run drivers: the page fold that turns a document plus a tag list into
//! annotations, a reconciled partition, and a trailing report page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MarkError, SourceError};
use crate::report::{self, ReportPolicy};
use crate::source::{Annotator, FragmentSource, TextSource};
use crate::strategy::{
    MatchOrigin, MatchStrategy, OcrFuzzy, PageMatches, PageObservation, TextLayerExact,
    TextLayerStructural,
};
use crate::strictness::StrictnessLevel;
use crate::tags::TagLedger;
use crate::types::{Rgb, MIN_CONFIDENCE};

/// Run-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkOptions {
    pub strictness: StrictnessLevel,
    /// Run the structural regex prescan alongside literal search.
    pub structural_prescan: bool,
    pub report_policy: ReportPolicy,
    /// Outward growth of every region before drawing.
    pub margin: f64,
    pub stroke: Rgb,
    /// Fragments below this confidence are dropped at collection.
    pub min_confidence: f32,
    /// Rasterization scale for the OCR path.
    pub raster_scale: f32,
}

impl Default for MarkOptions {
    fn default() -> Self {
        MarkOptions {
            strictness: StrictnessLevel::Moderate,
            structural_prescan: true,
            report_policy: ReportPolicy::Always,
            margin: 2.0,
            stroke: Rgb::RED,
            min_confidence: MIN_CONFIDENCE,
            raster_scale: 2.0,
        }
    }
}

/// Outcome counters and the final partition for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Found tags, tag-source order.
    pub found: Vec<String>,
    /// Never-found tags, tag-source order.
    pub missing: Vec<String>,
    pub pages: usize,
    pub annotations: usize,
    pub failed_annotations: usize,
    pub report_appended: bool,
}

fn fatal(err: SourceError) -> MarkError {
    match err {
        SourceError::Page { page, reason } => MarkError::PageAccess { page, reason },
        SourceError::Annotation(reason) => MarkError::Document(reason),
    }
}

struct Counters {
    annotations: usize,
    failed: usize,
}

/// Draws one page's findings and folds them into the ledger.
///
/// Annotation failures are recovered here: the region is skipped, the
/// failure counted and logged. A literal finding needs at least one drawn
/// region to count as found; structural, suffix and fuzzy findings stand on
/// text evidence alone.
fn apply_matches<A: Annotator + ?Sized>(
    doc: &mut A,
    page_index: usize,
    matches: &PageMatches,
    ledger: &mut TagLedger,
    options: &MarkOptions,
    counters: &mut Counters,
) {
    for finding in &matches.findings {
        let mut drawn = 0usize;
        for region in &finding.regions {
            let expanded = region.expand(options.margin);
            match doc.draw_rectangle(page_index, expanded, options.stroke) {
                Ok(()) => {
                    drawn += 1;
                    counters.annotations += 1;
                }
                Err(err) => {
                    counters.failed += 1;
                    warn!(page = page_index, tag = %finding.tag, error = %err, "annotation skipped");
                }
            }
        }
        let found = match finding.origin {
            MatchOrigin::Literal => drawn > 0,
            MatchOrigin::Structural | MatchOrigin::Suffix | MatchOrigin::Fuzzy => true,
        };
        if found {
            ledger.mark_found(&finding.tag);
        }
    }
}

fn finish<A: Annotator + ?Sized>(
    doc: &mut A,
    ledger: &TagLedger,
    options: &MarkOptions,
    pages: usize,
    counters: Counters,
) -> Result<RunSummary, MarkError> {
    let found = ledger.found_tags();
    let missing = ledger.missing_tags();
    let appended = report::should_append(options.report_policy, ledger.tags().len(), missing.len());
    if appended {
        let body = report::render_report(&missing);
        doc.append_text_page(&body, report::REPORT_FONT_SIZE, report::REPORT_POSITION)
            .map_err(fatal)?;
    }
    info!(
        pages,
        found = found.len(),
        missing = missing.len(),
        annotations = counters.annotations,
        failed = counters.failed,
        "run complete"
    );
    Ok(RunSummary {
        found,
        missing,
        pages,
        annotations: counters.annotations,
        failed_annotations: counters.failed,
        report_appended: appended,
    })
}

/// Text-layer run: literal search per tag, optional structural prescan,
/// immediate annotation, reconciliation, report page.
pub fn run_text_layer<D>(
    doc: &mut D,
    tags: &[String],
    options: &MarkOptions,
) -> Result<RunSummary, MarkError>
where
    D: TextSource + Annotator,
{
    let strategy: Box<dyn MatchStrategy> = if options.structural_prescan {
        Box::new(TextLayerStructural {
            level: options.strictness,
        })
    } else {
        Box::new(TextLayerExact)
    };

    let mut ledger = TagLedger::new(tags.iter().cloned());
    let tag_list = ledger.tags().to_vec();
    let pages = doc.page_count().map_err(fatal)?;
    let mut counters = Counters {
        annotations: 0,
        failed: 0,
    };

    info!(pages, tags = tag_list.len(), strategy = strategy.name(), "text-layer run");
    for index in 0..pages {
        let text = doc.page_text(index).map_err(fatal)?;
        let mut literal_regions = BTreeMap::new();
        for tag in &tag_list {
            let regions = doc.search_literal(index, tag).map_err(fatal)?;
            literal_regions.insert(tag.clone(), regions);
        }
        let observation = PageObservation {
            index,
            text,
            literal_regions,
            fragments: Vec::new(),
        };
        let matches = strategy.evaluate(&observation, &tag_list);
        apply_matches(doc, index, &matches, &mut ledger, options, &mut counters);
    }

    finish(doc, &ledger, options, pages, counters)
}

/// OCR run: per-page fragments from `source`, fuzzy matching, annotation
/// onto `doc`, reconciliation, report page.
pub fn run_ocr<A>(
    doc: &mut A,
    source: &mut dyn FragmentSource,
    tags: &[String],
    options: &MarkOptions,
) -> Result<RunSummary, MarkError>
where
    A: Annotator,
{
    let strategy = OcrFuzzy {
        level: options.strictness,
    };
    let mut ledger = TagLedger::new(tags.iter().cloned());
    let tag_list = ledger.tags().to_vec();
    let pages = source.page_count().map_err(fatal)?;
    let mut counters = Counters {
        annotations: 0,
        failed: 0,
    };

    info!(pages, tags = tag_list.len(), strategy = strategy.name(), "ocr run");
    for index in 0..pages {
        let fragments = source.page_fragments(index).map_err(fatal)?;
        let observation = PageObservation {
            index,
            text: String::new(),
            literal_regions: BTreeMap::new(),
            fragments,
        };
        let matches = strategy.evaluate(&observation, &tag_list);
        apply_matches(doc, index, &matches, &mut ledger, options, &mut counters);
    }

    finish(doc, &ledger, options, pages, counters)
}
