//! Render, clean up, detect, and hand fragments to the matching engine.

use image::{DynamicImage, GrayImage};
use tracing::debug;

use tagmark_core::{FragmentSource, MarkOptions, Point, Quad, SourceError, TextFragment};

use crate::detector::TextDetector;
use crate::error::Result;
use crate::preprocess;

/// One page rendered for detection.
pub struct RenderedPage {
    pub image: DynamicImage,
    /// Pixels per page point actually rendered; must be positive. Geometry
    /// mapping divides by this value, not by the requested scale.
    pub scale: f32,
    /// Height of the source page in points, for flipping raster rows into
    /// page coordinates.
    pub page_height: f32,
}

/// Renders pages of the document being marked.
pub trait PageRasterizer {
    fn page_count(&self) -> Result<usize>;

    /// Renders one page at `scale` pixels per page point.
    fn render(&mut self, page_index: usize, scale: f32) -> Result<RenderedPage>;
}

/// Detects fragments on one rendered page.
///
/// The raster is deskewed, detection runs once upright and once rotated a
/// quarter turn to catch sideways labels, low-confidence fragments are
/// dropped, and the surviving geometry is mapped into page coordinates with
/// the origin at the bottom-left corner.
pub fn detect_page(
    rendered: &RenderedPage,
    detector: &dyn TextDetector,
    min_confidence: f32,
) -> Result<Vec<TextFragment>> {
    let gray = rendered.image.to_luma8();
    let (deskewed, angle) = preprocess::deskew(&gray);
    if angle != 0.0 {
        debug!(angle, "page deskewed before detection");
    }

    let raster_fragments = detect_both_orientations(&deskewed, detector)?;

    let scale = rendered.scale as f64;
    let page_height = rendered.page_height as f64;
    let mut fragments = Vec::new();
    let mut dropped = 0usize;
    for fragment in raster_fragments {
        if fragment.confidence <= min_confidence {
            dropped += 1;
            continue;
        }
        let bounds = to_page_space(&fragment.bounds, scale, page_height);
        fragments.push(TextFragment { bounds, ..fragment });
    }
    if dropped > 0 {
        debug!(dropped, min_confidence, "low-confidence fragments dropped");
    }
    Ok(fragments)
}

/// Runs the detector upright and once more on a quarter-turned raster, with
/// the second pass's boxes mapped back into upright pixel coordinates.
fn detect_both_orientations(
    upright: &GrayImage,
    detector: &dyn TextDetector,
) -> Result<Vec<TextFragment>> {
    let height = upright.height();
    let mut fragments = detector.detect(&DynamicImage::ImageLuma8(upright.clone()))?;

    let turned = image::imageops::rotate90(upright);
    let sideways = detector.detect(&DynamicImage::ImageLuma8(turned))?;
    if !sideways.is_empty() {
        debug!(count = sideways.len(), "sideways fragments detected");
    }
    fragments.extend(sideways.into_iter().map(|fragment| TextFragment {
        bounds: unrotate_quad(&fragment.bounds, height),
        ..fragment
    }));
    Ok(fragments)
}

/// Inverse of a clockwise quarter turn: a turned-raster point (x, y) came
/// from (y, H - 1 - x) in the upright raster of height H.
fn unrotate_quad(bounds: &Quad, upright_height: u32) -> Quad {
    let h = upright_height as f64;
    Quad::new(bounds.points.map(|p| Point {
        x: p.y,
        y: h - 1.0 - p.x,
    }))
}

/// Raster pixels (origin top-left, y down) to page points (origin
/// bottom-left, y up).
fn to_page_space(bounds: &Quad, scale: f64, page_height: f64) -> Quad {
    Quad::new(bounds.points.map(|p| Point {
        x: p.x / scale,
        y: page_height - p.y / scale,
    }))
}

/// OCR-backed fragment source over a rasterizer and a detection backend.
pub struct OcrPageSource<'a, R> {
    rasterizer: R,
    detector: &'a dyn TextDetector,
    min_confidence: f32,
    scale: f32,
}

impl<'a, R: PageRasterizer> OcrPageSource<'a, R> {
    /// The confidence gate and raster scale are taken from the options the
    /// run is driven with.
    pub fn new(rasterizer: R, detector: &'a dyn TextDetector, options: &MarkOptions) -> Self {
        OcrPageSource {
            rasterizer,
            detector,
            min_confidence: options.min_confidence,
            scale: options.raster_scale,
        }
    }
}

impl<R: PageRasterizer> FragmentSource for OcrPageSource<'_, R> {
    fn page_count(&self) -> std::result::Result<usize, SourceError> {
        self.rasterizer
            .page_count()
            .map_err(|e| SourceError::page(0, e.to_string()))
    }

    fn page_fragments(
        &mut self,
        page_index: usize,
    ) -> std::result::Result<Vec<TextFragment>, SourceError> {
        let rendered = self
            .rasterizer
            .render(page_index, self.scale)
            .map_err(|e| SourceError::page(page_index, e.to_string()))?;
        detect_page(&rendered, self.detector, self.min_confidence)
            .map_err(|e| SourceError::page(page_index, e.to_string()))
    }
}
