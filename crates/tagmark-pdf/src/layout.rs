//! Positioned text extraction from page content streams.
//!
//! Walks the text-showing operators of a page and produces [`TextSpan`]s
//! carrying the baseline position and font size that were active when the
//! string was shown. Glyph metrics are not consulted; horizontal extents are
//! estimated from the font size, which is plenty for drawing highlight boxes
//! around matched codes.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use tagmark_core::Region;

use crate::error::{PdfMarkError, Result};

/// A run of text shown by a single operator, with the text-space position
/// that was current when it was shown.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Baseline start in text space.
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
}

/// Average glyph advance as a fraction of the font size. Helvetica averages
/// just under half an em for mixed alphanumeric text.
const AVG_GLYPH_ADVANCE: f64 = 0.5;

/// Vertical extent of a highlight region relative to the baseline.
const DESCENT_RATIO: f64 = 0.2;
const ASCENT_RATIO: f64 = 0.8;

impl TextSpan {
    /// Estimated width of the whole span.
    fn advance(&self) -> f64 {
        self.text.chars().count() as f64 * AVG_GLYPH_ADVANCE * self.font_size
    }
}

/// Extracts positioned spans from one page.
pub fn page_spans(doc: &Document, page_id: ObjectId) -> Result<Vec<TextSpan>> {
    let content = doc
        .get_page_content(page_id)
        .map_err(|e| PdfMarkError::ParseError(format!("content stream: {e}")))?;
    let content = Content::decode(&content)
        .map_err(|e| PdfMarkError::ParseError(format!("content decode: {e}")))?;
    Ok(spans_from_content(&content))
}

/// Walks the operations of a decoded content stream.
///
/// Only the text operators that move the cursor or show strings are
/// interpreted; graphics state is ignored. `Td`/`TD` offsets accumulate from
/// the `BT` origin, which matches how generators emit one positioning
/// operator per line.
fn spans_from_content(content: &Content) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut x = 0.0;
    let mut y = 0.0;
    let mut font_size = 12.0;
    let mut leading = 0.0;

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                x = 0.0;
                y = 0.0;
            }
            "Tf" => {
                if let Some(size) = number(op.operands.get(1)) {
                    font_size = size;
                }
            }
            "Td" => {
                x += number(op.operands.first()).unwrap_or(0.0);
                y += number(op.operands.get(1)).unwrap_or(0.0);
            }
            "TD" => {
                let tx = number(op.operands.first()).unwrap_or(0.0);
                let ty = number(op.operands.get(1)).unwrap_or(0.0);
                x += tx;
                y += ty;
                leading = -ty;
            }
            "Tm" => {
                // Only the translation part of the matrix is of interest.
                if let (Some(e), Some(f)) =
                    (number(op.operands.get(4)), number(op.operands.get(5)))
                {
                    x = e;
                    y = f;
                }
            }
            "TL" => {
                if let Some(l) = number(op.operands.first()) {
                    leading = l;
                }
            }
            "T*" => {
                y -= leading;
            }
            "Tj" => {
                if let Some(text) = op.operands.first().and_then(decode_text) {
                    push_span(&mut spans, &mut x, y, font_size, text);
                }
            }
            "'" => {
                y -= leading;
                if let Some(text) = op.operands.first().and_then(decode_text) {
                    push_span(&mut spans, &mut x, y, font_size, text);
                }
            }
            "\"" => {
                y -= leading;
                if let Some(text) = op.operands.get(2).and_then(decode_text) {
                    push_span(&mut spans, &mut x, y, font_size, text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(_, _) => {
                                if let Some(part) = decode_text(item) {
                                    text.push_str(&part);
                                }
                            }
                            // Large negative adjustments are word gaps.
                            Object::Integer(n) if *n < -100 => text.push(' '),
                            _ => {}
                        }
                    }
                    if !text.is_empty() {
                        push_span(&mut spans, &mut x, y, font_size, text);
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

fn push_span(spans: &mut Vec<TextSpan>, x: &mut f64, y: f64, font_size: f64, text: String) {
    if text.is_empty() {
        return;
    }
    let span = TextSpan {
        text,
        x: *x,
        y,
        font_size,
    };
    *x += span.advance();
    spans.push(span);
}

fn number(obj: Option<&Object>) -> Option<f64> {
    match obj? {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Decodes a string operand, trying UTF-8, then UTF-16BE, then Latin-1.
fn decode_text(obj: &Object) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_string());
    }
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter(|c| c.len() == 2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        if let Ok(text) = String::from_utf16(&utf16) {
            return Some(text);
        }
    }
    Some(bytes.iter().map(|&b| b as char).collect())
}

/// Joins spans into the page's plain text. A change of baseline starts a new
/// line; spans on the same baseline are separated by a space unless they abut.
pub fn assemble_text(spans: &[TextSpan]) -> String {
    let mut text = String::new();
    let mut prev: Option<&TextSpan> = None;
    for span in spans {
        if let Some(p) = prev {
            if (p.y - span.y).abs() > f64::EPSILON {
                text.push('\n');
            } else {
                let gap = span.x - (p.x + p.advance());
                if gap.abs() > AVG_GLYPH_ADVANCE * p.font_size * 0.5 {
                    text.push(' ');
                }
            }
        }
        text.push_str(&span.text);
        prev = Some(span);
    }
    text
}

/// Finds non-overlapping occurrences of `literal` within individual spans and
/// returns an estimated bounding region for each.
///
/// Occurrences that straddle two spans are not detected; a code broken across
/// text runs surfaces through the structural pass instead, without a region.
pub fn search_in_spans(spans: &[TextSpan], literal: &str) -> Vec<Region> {
    let needle: Vec<char> = literal.chars().collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut regions = Vec::new();
    for span in spans {
        let chars: Vec<char> = span.text.chars().collect();
        if needle.len() > chars.len() {
            continue;
        }
        let step = AVG_GLYPH_ADVANCE * span.font_size;
        let mut start = 0;
        while start + needle.len() <= chars.len() {
            if chars[start..start + needle.len()] == needle[..] {
                let x0 = span.x + step * start as f64;
                let x1 = x0 + step * needle.len() as f64;
                let y0 = span.y - DESCENT_RATIO * span.font_size;
                let y1 = span.y + ASCENT_RATIO * span.font_size;
                regions.push(Region::new(x0, y0, x1, y1));
                start += needle.len();
            } else {
                start += 1;
            }
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::StringFormat;
    use pretty_assertions::assert_eq;

    fn show(text: &str) -> Object {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn two_line_content() -> Content {
        Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![show("Weld record 12-L-3456")]),
                Operation::new("Td", vec![0.into(), (-20).into()]),
                Operation::new("Tj", vec![show("second line")]),
                Operation::new("ET", vec![]),
            ],
        }
    }

    #[test]
    fn test_spans_track_position_and_size() {
        let spans = spans_from_content(&two_line_content());
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Weld record 12-L-3456");
        assert_eq!(spans[0].x, 50.0);
        assert_eq!(spans[0].y, 700.0);
        assert_eq!(spans[0].font_size, 12.0);
        assert_eq!(spans[1].y, 680.0);
    }

    #[test]
    fn test_assemble_text_breaks_lines_on_baseline_change() {
        let spans = spans_from_content(&two_line_content());
        assert_eq!(assemble_text(&spans), "Weld record 12-L-3456\nsecond line");
    }

    #[test]
    fn test_tm_sets_absolute_position() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tm",
                    vec![
                        1.into(),
                        0.into(),
                        0.into(),
                        1.into(),
                        Object::Real(72.5),
                        400.into(),
                    ],
                ),
                Operation::new("Tj", vec![show("positioned")]),
                Operation::new("ET", vec![]),
            ],
        };
        let spans = spans_from_content(&content);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].x, 72.5);
        assert_eq!(spans[0].y, 400.0);
    }

    #[test]
    fn test_tl_and_quote_advance_lines() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("TL", vec![14.into()]),
                Operation::new("Tj", vec![show("first")]),
                Operation::new("'", vec![show("second")]),
                Operation::new("ET", vec![]),
            ],
        };
        let spans = spans_from_content(&content);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].y, 686.0);
    }

    #[test]
    fn test_tj_array_inserts_word_gaps() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Td", vec![10.into(), 10.into()]),
                Operation::new(
                    "TJ",
                    vec![Object::Array(vec![
                        show("Tag"),
                        Object::Integer(-250),
                        show("42-L-9000"),
                    ])],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let spans = spans_from_content(&content);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Tag 42-L-9000");
    }

    #[test]
    fn test_utf16be_strings_decode() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Δ-42".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tj",
                    vec![Object::String(bytes, StringFormat::Hexadecimal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let spans = spans_from_content(&content);
        assert_eq!(spans[0].text, "Δ-42");
    }

    #[test]
    fn test_search_finds_occurrence_with_region() {
        let spans = spans_from_content(&two_line_content());
        let regions = search_in_spans(&spans, "12-L-3456");
        assert_eq!(regions.len(), 1);
        // "Weld record " is 12 chars at 6pt average advance.
        let r = &regions[0];
        assert_eq!(r.x0, 50.0 + 12.0 * 6.0);
        assert_eq!(r.x1, r.x0 + 9.0 * 6.0);
        assert_eq!(r.y0, 700.0 - 2.4);
        assert_eq!(r.y1, 700.0 + 9.6);
    }

    #[test]
    fn test_search_misses_text_split_across_spans() {
        let spans = vec![
            TextSpan {
                text: "12-L-".into(),
                x: 10.0,
                y: 100.0,
                font_size: 12.0,
            },
            TextSpan {
                text: "3456".into(),
                x: 40.0,
                y: 100.0,
                font_size: 12.0,
            },
        ];
        assert!(search_in_spans(&spans, "12-L-3456").is_empty());
    }

    #[test]
    fn test_search_empty_literal_matches_nothing() {
        let spans = spans_from_content(&two_line_content());
        assert!(search_in_spans(&spans, "").is_empty());
    }

    #[test]
    fn test_repeated_occurrences_in_one_span() {
        let spans = vec![TextSpan {
            text: "12-L-3456 then 12-L-3456".into(),
            x: 0.0,
            y: 50.0,
            font_size: 10.0,
        }];
        let regions = search_in_spans(&spans, "12-L-3456");
        assert_eq!(regions.len(), 2);
        assert!(regions[1].x0 > regions[0].x1);
    }
}
