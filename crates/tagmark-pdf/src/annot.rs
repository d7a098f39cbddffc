//! Square annotations and the appended report page.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use tagmark_core::{Region, Rgb};

use crate::error::{PdfMarkError, Result};

/// Width and height of an appended page, in points (US Letter).
const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;

/// Adds an unfilled square annotation outlining `region` to a page.
pub fn add_square(
    doc: &mut Document,
    page_id: ObjectId,
    region: Region,
    stroke: Rgb,
) -> Result<()> {
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Square".to_vec()));
    annot.set(
        "Rect",
        Object::Array(vec![
            Object::Real(region.x0 as f32),
            Object::Real(region.y0 as f32),
            Object::Real(region.x1 as f32),
            Object::Real(region.y1 as f32),
        ]),
    );
    annot.set(
        "C",
        Object::Array(vec![
            Object::Real(stroke.r),
            Object::Real(stroke.g),
            Object::Real(stroke.b),
        ]),
    );
    let mut border_style = Dictionary::new();
    border_style.set("W", Object::Integer(1));
    annot.set("BS", Object::Dictionary(border_style));

    let annot_id = doc.add_object(Object::Dictionary(annot));
    attach_to_page(doc, page_id, annot_id)
}

/// Pushes an annotation reference onto the page's /Annots array, creating the
/// array if the page has none yet.
fn attach_to_page(doc: &mut Document, page_id: ObjectId, annot_id: ObjectId) -> Result<()> {
    // /Annots may be held indirectly; push into the referenced array then.
    let annots_ref = doc
        .get_object(page_id)
        .ok()
        .and_then(|obj| obj.as_dict().ok())
        .and_then(|dict| dict.get(b"Annots").ok())
        .and_then(|obj| obj.as_reference().ok());
    if let Some(array_id) = annots_ref {
        if let Ok(Object::Array(annots)) = doc.get_object_mut(array_id) {
            annots.push(Object::Reference(annot_id));
            return Ok(());
        }
    }

    let page_obj = doc
        .get_object_mut(page_id)
        .map_err(|e| PdfMarkError::PageTree(format!("page object: {e}")))?;
    if let Object::Dictionary(ref mut page_dict) = page_obj {
        if let Ok(Object::Array(ref mut annots)) = page_dict.get_mut(b"Annots") {
            annots.push(Object::Reference(annot_id));
        } else {
            page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
        }
        Ok(())
    } else {
        Err(PdfMarkError::PageTree(format!(
            "page {page_id:?} is not a dictionary"
        )))
    }
}

/// Appends a fresh Letter-sized page holding `text` and returns its id.
///
/// `position` is measured from the top-left corner of the page; each line of
/// `text` is shown on its own baseline.
pub fn append_text_page(
    doc: &mut Document,
    text: &str,
    font_size: f32,
    position: (f32, f32),
) -> Result<ObjectId> {
    let pages_id = root_pages_id(doc)?;

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let start_y = PAGE_HEIGHT as f32 - position.1;
    let leading = font_size * 1.2;
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), font_size.into()]),
        Operation::new("Td", vec![position.0.into(), start_y.into()]),
        Operation::new("TL", vec![leading.into()]),
    ];
    for (index, line) in text.lines().enumerate() {
        if index > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(
                line.as_bytes().to_vec(),
                StringFormat::Literal,
            )],
        ));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let encoded = content
        .encode()
        .map_err(|e| PdfMarkError::ContentEncoding(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });

    register_page(doc, pages_id, page_id)?;
    Ok(page_id)
}

/// Resolves the root /Pages node from the trailer.
fn root_pages_id(doc: &Document) -> Result<ObjectId> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| PdfMarkError::PageTree(format!("trailer root: {e}")))?;
    let catalog = doc
        .get_object(catalog_id)
        .and_then(Object::as_dict)
        .map_err(|e| PdfMarkError::PageTree(format!("catalog: {e}")))?;
    catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|e| PdfMarkError::PageTree(format!("catalog pages: {e}")))
}

/// Adds a page reference to the root /Pages node and bumps its count.
fn register_page(doc: &mut Document, pages_id: ObjectId, page_id: ObjectId) -> Result<()> {
    let pages_obj = doc
        .objects
        .get_mut(&pages_id)
        .ok_or_else(|| PdfMarkError::PageTree("pages node missing".to_string()))?;
    let pages_dict = pages_obj
        .as_dict_mut()
        .map_err(|e| PdfMarkError::PageTree(format!("pages node: {e}")))?;

    let count = pages_dict
        .get(b"Count")
        .ok()
        .and_then(|c| c.as_i64().ok())
        .unwrap_or(0);
    if let Ok(Object::Array(ref mut kids)) = pages_dict.get_mut(b"Kids") {
        kids.push(Object::Reference(page_id));
    } else {
        pages_dict.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    }
    pages_dict.set("Count", Object::Integer(count + 1));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout;
    use pretty_assertions::assert_eq;

    fn test_document() -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        b"body".to_vec(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (doc, page_id)
    }

    fn page_annotations(doc: &Document, page_id: ObjectId) -> Vec<Dictionary> {
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let Ok(annots) = page.get(b"Annots") else {
            return Vec::new();
        };
        annots
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| {
                let id = entry.as_reference().unwrap();
                doc.get_object(id).unwrap().as_dict().unwrap().clone()
            })
            .collect()
    }

    #[test]
    fn test_add_square_creates_annots_array() {
        let (mut doc, page_id) = test_document();
        add_square(
            &mut doc,
            page_id,
            Region::new(10.0, 20.0, 110.0, 40.0),
            Rgb::RED,
        )
        .unwrap();

        let annots = page_annotations(&doc, page_id);
        assert_eq!(annots.len(), 1);
        let annot = &annots[0];
        assert_eq!(annot.get(b"Subtype").unwrap().as_name().unwrap(), b"Square");
        let rect = annot.get(b"Rect").unwrap().as_array().unwrap();
        assert_eq!(rect[0].as_float().unwrap(), 10.0);
        assert_eq!(rect[3].as_float().unwrap(), 40.0);
        let color = annot.get(b"C").unwrap().as_array().unwrap();
        assert_eq!(color[0].as_float().unwrap(), 1.0);
        assert_eq!(color[1].as_float().unwrap(), 0.0);
    }

    #[test]
    fn test_add_square_appends_to_existing_annots() {
        let (mut doc, page_id) = test_document();
        add_square(&mut doc, page_id, Region::new(0.0, 0.0, 5.0, 5.0), Rgb::RED).unwrap();
        add_square(
            &mut doc,
            page_id,
            Region::new(10.0, 10.0, 15.0, 15.0),
            Rgb::RED,
        )
        .unwrap();
        assert_eq!(page_annotations(&doc, page_id).len(), 2);
    }

    #[test]
    fn test_append_text_page_registers_in_tree() {
        let (mut doc, _) = test_document();
        let new_id = append_text_page(&mut doc, "Missing tags (1):\n99-L-0001", 12.0, (50.0, 50.0))
            .unwrap();

        let pages_id = root_pages_id(&doc).unwrap();
        let pages = doc.get_object(pages_id).unwrap().as_dict().unwrap();
        assert_eq!(pages.get(b"Count").unwrap().as_i64().unwrap(), 2);
        let kids = pages.get(b"Kids").unwrap().as_array().unwrap();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[1].as_reference().unwrap(), new_id);
    }

    #[test]
    fn test_appended_page_carries_each_line() {
        let (mut doc, _) = test_document();
        let new_id =
            append_text_page(&mut doc, "Missing tags (1):\n99-L-0001", 12.0, (50.0, 50.0))
                .unwrap();

        let spans = layout::page_spans(&doc, new_id).unwrap();
        let text = layout::assemble_text(&spans);
        assert_eq!(text, "Missing tags (1):\n99-L-0001");
        // Drawn near the top, offset from the top-left corner.
        assert_eq!(spans[0].x, 50.0);
        assert_eq!(spans[0].y, 742.0);
    }
}
