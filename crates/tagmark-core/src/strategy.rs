//! Match strategies: a closed set of page evaluators behind one trait.
//!
//! Strategies are pure. The run driver prefetches everything a page can
//! offer into a [`PageObservation`]; evaluation never touches a collaborator,
//! so each strategy is unit-testable on plain data.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::strictness::{self, StrictnessLevel};
use crate::types::{Region, TextFragment};

/// Everything a strategy may inspect about one page.
#[derive(Debug, Clone, Default)]
pub struct PageObservation {
    pub index: usize,
    /// Text-layer content; empty on the OCR path.
    pub text: String,
    /// Literal-search regions per tag, as the page provider returned them.
    pub literal_regions: BTreeMap<String, Vec<Region>>,
    /// OCR fragments, already confidence-gated; empty on the text path.
    pub fragments: Vec<TextFragment>,
}

/// How a finding was established.
///
/// Literal findings only count as found once a region is actually drawn;
/// the other origins stand on text evidence alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrigin {
    Literal,
    Structural,
    Suffix,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagFinding {
    pub tag: String,
    pub origin: MatchOrigin,
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMatches {
    pub findings: Vec<TagFinding>,
}

impl PageMatches {
    pub fn tags(&self) -> Vec<&str> {
        self.findings.iter().map(|f| f.tag.as_str()).collect()
    }
}

pub trait MatchStrategy {
    fn name(&self) -> &'static str;

    fn evaluate(&self, page: &PageObservation, tags: &[String]) -> PageMatches;
}

/// Literal location search only: a tag is found where the provider located it.
pub struct TextLayerExact;

impl MatchStrategy for TextLayerExact {
    fn name(&self) -> &'static str {
        "text-layer-exact"
    }

    fn evaluate(&self, page: &PageObservation, tags: &[String]) -> PageMatches {
        let mut findings = Vec::new();
        let mut seen = HashSet::new();
        for tag in tags {
            if !seen.insert(tag.as_str()) {
                continue;
            }
            let regions = page
                .literal_regions
                .get(tag)
                .cloned()
                .unwrap_or_default();
            if !regions.is_empty() {
                findings.push(TagFinding {
                    tag: tag.clone(),
                    origin: MatchOrigin::Literal,
                    regions,
                });
            }
        }
        PageMatches { findings }
    }
}

/// Literal search plus the structural regex prescan.
///
/// A pattern hit equal to a tag confirms its presence even when no literal
/// region exists; under `Tolerant` a hit equal to the tag's 4-digit numeric
/// suffix does the same.
pub struct TextLayerStructural {
    pub level: StrictnessLevel,
}

impl MatchStrategy for TextLayerStructural {
    fn name(&self) -> &'static str {
        "text-layer-structural"
    }

    fn evaluate(&self, page: &PageObservation, tags: &[String]) -> PageMatches {
        let mut matches = TextLayerExact.evaluate(page, tags);
        let hits = strictness::pattern_hits(self.level, &page.text);
        if hits.is_empty() {
            return matches;
        }
        debug!(page = page.index, hits = hits.len(), "structural prescan");

        let mut seen = HashSet::new();
        for tag in tags {
            if !seen.insert(tag.as_str()) {
                continue;
            }
            if hits.iter().any(|h| h == tag) {
                matches.findings.push(TagFinding {
                    tag: tag.clone(),
                    origin: MatchOrigin::Structural,
                    regions: Vec::new(),
                });
                continue;
            }
            if self.level == StrictnessLevel::Tolerant {
                if let Some(suffix) = strictness::numeric_suffix(tag) {
                    if hits.iter().any(|h| h == suffix) {
                        matches.findings.push(TagFinding {
                            tag: tag.clone(),
                            origin: MatchOrigin::Suffix,
                            regions: Vec::new(),
                        });
                    }
                }
            }
        }
        matches
    }
}

/// Fuzzy matching over OCR fragments.
///
/// Candidates come from the structural rule over the fragment blob (plus the
/// per-tag window rule under `Tolerant`); candidate and tag are then compared
/// after reduction to lowercase alphanumerics. Presence and drawability are
/// decoupled: a matched tag with no locatable fragment stays found.
pub struct OcrFuzzy {
    pub level: StrictnessLevel,
}

/// Lowercase alphanumeric reduction used on candidates and tags.
///
/// ASCII only, like the suffix rule in [`strictness`]: non-ASCII characters
/// never survive reduction, so fuzzy matching is scoped to ASCII tags.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Fragment-side reduction for the geometric lookup: spaces stripped only.
fn lookup_key(text: &str) -> String {
    text.replace(' ', "").to_lowercase()
}

impl OcrFuzzy {
    fn candidates(&self, blob: &str, tags: &[String]) -> Vec<String> {
        let mut candidates = strictness::pattern_hits(self.level, blob);
        if self.level == StrictnessLevel::Tolerant {
            let mut seen: HashSet<String> = candidates.iter().cloned().collect();
            for tag in tags {
                if let Some(window) = strictness::window_pattern(tag) {
                    for m in window.find_iter(blob) {
                        if seen.insert(m.as_str().to_string()) {
                            candidates.push(m.as_str().to_string());
                        }
                    }
                }
            }
        }
        candidates
    }
}

impl MatchStrategy for OcrFuzzy {
    fn name(&self) -> &'static str {
        "ocr-fuzzy"
    }

    fn evaluate(&self, page: &PageObservation, tags: &[String]) -> PageMatches {
        let blob = page
            .fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .replace('\n', " ");

        let candidates = self.candidates(&blob, tags);
        debug!(
            page = page.index,
            fragments = page.fragments.len(),
            candidates = candidates.len(),
            "ocr evaluation"
        );

        let mut findings = Vec::new();
        let mut seen = HashSet::new();
        for tag in tags {
            if !seen.insert(tag.as_str()) {
                continue;
            }
            let clean_tag = normalize(tag);
            if clean_tag.is_empty() {
                continue;
            }
            let matched = candidates
                .iter()
                .any(|candidate| normalize(candidate).contains(&clean_tag));
            if !matched {
                continue;
            }
            let regions: Vec<Region> = page
                .fragments
                .iter()
                .filter(|f| lookup_key(&f.text).contains(&clean_tag))
                .map(|f| f.bounds.to_region())
                .collect();
            findings.push(TagFinding {
                tag: tag.clone(),
                origin: MatchOrigin::Fuzzy,
                regions,
            });
        }
        PageMatches { findings }
    }
}
