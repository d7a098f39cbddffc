//! `TaggedDocument` adapts a loaded PDF to the engine's collaborator traits.

use std::cell::RefCell;
use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use tagmark_core::{Region, Rgb, SourceError, TextSource};

use crate::annot;
use crate::error::{PdfMarkError, Result};
use crate::layout::{self, TextSpan};

/// Verdict of the embedded-text probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLayerProbe {
    /// Enough embedded text to match against directly.
    Usable,
    /// Little or no embedded text; pages need rasterization and OCR.
    Scanned,
}

/// Extracted text shorter than this marks the document as scanned.
const MIN_TEXT_LENGTH: usize = 50;

/// Probes the embedded text layer of a whole document.
///
/// Extraction failures are treated as scanned rather than fatal, so damaged
/// text layers fall through to the raster path.
pub fn text_layer_probe(data: &[u8]) -> TextLayerProbe {
    match pdf_extract::extract_text_from_mem(data) {
        Ok(text) if text.trim().len() >= MIN_TEXT_LENGTH => TextLayerProbe::Usable,
        Ok(text) => {
            debug!(chars = text.trim().len(), "text layer too thin");
            TextLayerProbe::Scanned
        }
        Err(err) => {
            warn!(error = %err, "text extraction failed, treating as scanned");
            TextLayerProbe::Scanned
        }
    }
}

/// A document being marked. Wraps the parsed PDF with a page index and a
/// per-page span cache, and exposes the read and write seams the run
/// drivers need.
pub struct TaggedDocument {
    doc: Document,
    pages: Vec<ObjectId>,
    spans: RefCell<HashMap<usize, Vec<TextSpan>>>,
}

impl TaggedDocument {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(data)
            .map_err(|e| PdfMarkError::ParseError(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        let pages = doc.get_pages().values().copied().collect();
        TaggedDocument {
            doc,
            pages,
            spans: RefCell::new(HashMap::new()),
        }
    }

    /// Page object ids in page order, including any appended report page.
    pub fn pages(&self) -> &[ObjectId] {
        &self.pages
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Width and height of a page in points. Walks up the page tree for an
    /// inherited /MediaBox and falls back to US Letter.
    pub fn page_dimensions(&self, page_index: usize) -> (f64, f64) {
        const DEFAULT: (f64, f64) = (612.0, 792.0);
        let Some(&page_id) = self.pages.get(page_index) else {
            return DEFAULT;
        };
        let mut current = Some(page_id);
        for _ in 0..8 {
            let Some(id) = current else { break };
            let Ok(dict) = self.doc.get_object(id).and_then(Object::as_dict) else {
                break;
            };
            if let Some(dims) = media_box(dict) {
                return dims;
            }
            current = dict
                .get(b"Parent")
                .ok()
                .and_then(|p| p.as_reference().ok());
        }
        DEFAULT
    }

    /// Compresses streams and serializes the document.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.doc.compress();
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfMarkError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Runs `f` over the page's spans, extracting and caching them on first
    /// access. Content streams are untouched by annotation, so cached spans
    /// stay valid for the lifetime of the document.
    fn with_spans<T>(
        &self,
        page_index: usize,
        f: impl FnOnce(&[TextSpan]) -> T,
    ) -> std::result::Result<T, SourceError> {
        {
            let cache = self.spans.borrow();
            if let Some(spans) = cache.get(&page_index) {
                return Ok(f(spans));
            }
        }
        let page_id = self
            .pages
            .get(page_index)
            .copied()
            .ok_or_else(|| SourceError::page(page_index, "page out of range"))?;
        let spans = layout::page_spans(&self.doc, page_id)
            .map_err(|e| SourceError::page(page_index, e.to_string()))?;
        let result = f(&spans);
        self.spans.borrow_mut().insert(page_index, spans);
        Ok(result)
    }
}

fn media_box(dict: &Dictionary) -> Option<(f64, f64)> {
    let media = dict.get(b"MediaBox").ok()?.as_array().ok()?;
    if media.len() < 4 {
        return None;
    }
    let x0 = number(&media[0])?;
    let y0 = number(&media[1])?;
    let x1 = number(&media[2])?;
    let y1 = number(&media[3])?;
    Some((x1 - x0, y1 - y0))
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

impl TextSource for TaggedDocument {
    fn page_count(&self) -> std::result::Result<usize, SourceError> {
        Ok(self.pages.len())
    }

    fn page_text(&self, page_index: usize) -> std::result::Result<String, SourceError> {
        self.with_spans(page_index, layout::assemble_text)
    }

    fn search_literal(
        &self,
        page_index: usize,
        literal: &str,
    ) -> std::result::Result<Vec<Region>, SourceError> {
        self.with_spans(page_index, |spans| layout::search_in_spans(spans, literal))
    }
}

impl tagmark_core::Annotator for TaggedDocument {
    fn draw_rectangle(
        &mut self,
        page_index: usize,
        region: Region,
        stroke: Rgb,
    ) -> std::result::Result<(), SourceError> {
        if !region.is_valid() {
            return Err(SourceError::annotation(format!(
                "degenerate rectangle {region:?}"
            )));
        }
        let page_id = self
            .pages
            .get(page_index)
            .copied()
            .ok_or_else(|| {
                SourceError::annotation(format!("page {page_index} out of range"))
            })?;
        annot::add_square(&mut self.doc, page_id, region, stroke)
            .map_err(|e| SourceError::annotation(e.to_string()))
    }

    fn append_text_page(
        &mut self,
        text: &str,
        font_size: f32,
        position: (f32, f32),
    ) -> std::result::Result<(), SourceError> {
        let page_id = annot::append_text_page(&mut self.doc, text, font_size, position)
            .map_err(|e| SourceError::annotation(e.to_string()))?;
        self.pages.push(page_id);
        Ok(())
    }
}
