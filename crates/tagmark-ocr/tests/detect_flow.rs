//! OCR detection feeding the matching engine end to end.

use image::{DynamicImage, GrayImage, Luma};
use pretty_assertions::assert_eq;

use tagmark_core::{
    run_ocr, Annotator, MarkOptions, Quad, Region, Rgb, SourceError, StrictnessLevel,
    TextFragment,
};
use tagmark_ocr::{DetectError, OcrPageSource, PageRasterizer, RenderedPage, TextDetector};

/// One landscape page, 300x200 points, rendered at the requested scale.
struct OnePage;

impl PageRasterizer for OnePage {
    fn page_count(&self) -> Result<usize, DetectError> {
        Ok(1)
    }

    fn render(&mut self, _page_index: usize, scale: f32) -> Result<RenderedPage, DetectError> {
        let (width, height) = ((300.0 * scale) as u32, (200.0 * scale) as u32);
        Ok(RenderedPage {
            image: DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([255]))),
            scale,
            page_height: 200.0,
        })
    }
}

struct OneFragment {
    confidence: f32,
}

impl TextDetector for OneFragment {
    fn name(&self) -> &'static str {
        "one-fragment"
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<TextFragment>, DetectError> {
        if image.width() != 300 {
            return Ok(Vec::new());
        }
        Ok(vec![TextFragment::new(
            "AB1234CD",
            Quad::from_region(Region::new(40.0, 60.0, 120.0, 90.0)),
            self.confidence,
        )])
    }
}

#[derive(Default)]
struct Recorder {
    drawn: Vec<(usize, Region)>,
    appended: Vec<String>,
}

impl Annotator for Recorder {
    fn draw_rectangle(
        &mut self,
        page_index: usize,
        region: Region,
        _stroke: Rgb,
    ) -> Result<(), SourceError> {
        self.drawn.push((page_index, region));
        Ok(())
    }

    fn append_text_page(
        &mut self,
        text: &str,
        _font_size: f32,
        _position: (f32, f32),
    ) -> Result<(), SourceError> {
        self.appended.push(text.to_string());
        Ok(())
    }
}

fn tolerant() -> MarkOptions {
    MarkOptions {
        strictness: StrictnessLevel::Tolerant,
        // The detector's fixture box is stated in raster pixels at 1:1.
        raster_scale: 1.0,
        ..MarkOptions::default()
    }
}

#[test]
fn test_confident_fragment_marks_tag_with_its_box() {
    let options = tolerant();
    let detector = OneFragment { confidence: 0.5 };
    let mut source = OcrPageSource::new(OnePage, &detector, &options);
    let mut doc = Recorder::default();
    let tags = vec!["1234".to_string()];

    let summary = run_ocr(&mut doc, &mut source, &tags, &options).unwrap();

    assert_eq!(summary.found, tags);
    assert!(summary.missing.is_empty());
    assert_eq!(summary.annotations, 1);
    // Fragment box (40,60)-(120,90) px flips to y 110..140 on a 200-point
    // page, then grows by the 2-point margin.
    assert_eq!(doc.drawn, vec![(0, Region::new(38.0, 108.0, 122.0, 142.0))]);
    assert_eq!(
        doc.appended,
        vec!["Missing tags (0):\nAll tags were found.".to_string()]
    );
}

#[test]
fn test_low_confidence_fragment_leaves_tag_missing() {
    let options = tolerant();
    let detector = OneFragment { confidence: 0.3 };
    let mut source = OcrPageSource::new(OnePage, &detector, &options);
    let mut doc = Recorder::default();
    let tags = vec!["1234".to_string()];

    let summary = run_ocr(&mut doc, &mut source, &tags, &options).unwrap();

    assert!(summary.found.is_empty());
    assert_eq!(summary.missing, tags);
    assert_eq!(summary.annotations, 0);
    assert!(doc.drawn.is_empty());
    assert_eq!(
        doc.appended,
        vec!["Missing tags (1):\n1234".to_string()]
    );
}
