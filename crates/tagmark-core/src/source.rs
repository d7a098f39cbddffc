//! Collaborator seams: the engine talks to documents, rasters, and OCR
//! engines only through these traits.

use crate::error::SourceError;
use crate::types::{Region, Rgb, TextFragment};

/// Read access to a document's text layer.
pub trait TextSource {
    fn page_count(&self) -> Result<usize, SourceError>;

    /// Linear text content of the page; empty when the page has none.
    fn page_text(&self, page_index: usize) -> Result<String, SourceError>;

    /// Regions where `literal` occurs on the page, zero or more. An empty
    /// literal yields no regions.
    fn search_literal(&self, page_index: usize, literal: &str)
        -> Result<Vec<Region>, SourceError>;
}

/// Write access for markers and the trailing report page.
pub trait Annotator {
    /// Draws a stroked rectangle on the page.
    fn draw_rectangle(
        &mut self,
        page_index: usize,
        region: Region,
        stroke: Rgb,
    ) -> Result<(), SourceError>;

    /// Appends a new page carrying `text` laid out line by line starting at
    /// `position`, measured from the page's top-left corner.
    fn append_text_page(
        &mut self,
        text: &str,
        font_size: f32,
        position: (f32, f32),
    ) -> Result<(), SourceError>;
}

/// Per-page OCR fragments for documents without a usable text layer.
/// Implementations apply the confidence gate before returning.
pub trait FragmentSource {
    fn page_count(&self) -> Result<usize, SourceError>;

    fn page_fragments(&mut self, page_index: usize) -> Result<Vec<TextFragment>, SourceError>;
}
