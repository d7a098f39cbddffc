//! PDF side of the tag marking engine.
//!
//! Parses and stitches uploaded documents, walks their text layers with
//! positions, draws square annotations around matched codes, and appends the
//! reconciliation report page. The matching itself lives in `tagmark-core`;
//! this crate supplies the [`TaggedDocument`] collaborator and the end-to-end
//! entry points.

pub mod annot;
pub mod concat;
pub mod document;
pub mod error;
pub mod layout;

pub use concat::concat_documents;
pub use document::{text_layer_probe, TaggedDocument, TextLayerProbe};
pub use error::PdfMarkError;

use tagmark_core::{run_ocr, run_text_layer, FragmentSource, MarkOptions, RunSummary};

/// Marked output bytes plus the reconciliation summary.
#[derive(Debug)]
pub struct MarkOutcome {
    pub bytes: Vec<u8>,
    pub summary: RunSummary,
}

/// Stitches the uploads in order, matches and annotates against the embedded
/// text layer, appends the report page per policy, and serializes the result.
pub fn mark_documents(
    inputs: &[Vec<u8>],
    tags: &[String],
    options: &MarkOptions,
) -> Result<MarkOutcome, PdfMarkError> {
    let merged = concat_documents(inputs)?;
    let mut doc = TaggedDocument::from_document(merged);
    let summary = run_text_layer(&mut doc, tags, options)?;
    let bytes = doc.to_bytes()?;
    Ok(MarkOutcome { bytes, summary })
}

/// The same flow for scanned documents: match evidence comes from `source`,
/// which must yield fragments for each stitched page in order, while
/// annotations land on the stitched document itself.
pub fn mark_documents_with_fragments(
    inputs: &[Vec<u8>],
    tags: &[String],
    options: &MarkOptions,
    source: &mut dyn FragmentSource,
) -> Result<MarkOutcome, PdfMarkError> {
    let merged = concat_documents(inputs)?;
    let mut doc = TaggedDocument::from_document(merged);
    let summary = run_ocr(&mut doc, source, tags, options)?;
    let bytes = doc.to_bytes()?;
    Ok(MarkOutcome { bytes, summary })
}

/// Page count of a single document, without keeping it around.
pub fn page_count(data: &[u8]) -> Result<usize, PdfMarkError> {
    let doc = lopdf::Document::load_mem(data)
        .map_err(|e| PdfMarkError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len())
}
