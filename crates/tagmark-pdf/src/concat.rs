//! Stitches uploaded documents into a single in-memory PDF.

use lopdf::{Document, Object, ObjectId};

use crate::error::{PdfMarkError, Result};

/// Concatenates documents in upload order and returns the combined document.
///
/// Object ids of each subsequent document are shifted past the ids already in
/// use, every internal reference is remapped by the same offset, and the root
/// page tree is rebuilt to list all pages in order.
pub fn concat_documents(inputs: &[Vec<u8>]) -> Result<Document> {
    if inputs.is_empty() {
        return Err(PdfMarkError::NoDocuments);
    }

    let mut merged = load_document(&inputs[0], 0)?;
    if inputs.len() == 1 {
        return Ok(merged);
    }

    let mut max_id = merged.max_id;
    let mut page_ids: Vec<ObjectId> = merged.get_pages().values().copied().collect();

    for (index, data) in inputs.iter().enumerate().skip(1) {
        let source = load_document(data, index)?;
        let id_offset = max_id;
        let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();
        max_id = id_offset + source.max_id;

        for (object_id, object) in source.objects.into_iter() {
            let new_id = (object_id.0 + id_offset, object_id.1);
            merged.objects.insert(new_id, remap_refs(object, id_offset));
        }
        page_ids.extend(
            source_pages
                .iter()
                .map(|&(number, generation)| (number + id_offset, generation)),
        );
    }

    rebuild_page_tree(&mut merged, &page_ids)?;
    merged.max_id = max_id;
    Ok(merged)
}

fn load_document(data: &[u8], index: usize) -> Result<Document> {
    Document::load_mem(data)
        .map_err(|e| PdfMarkError::ParseError(format!("document {index}: {e}")))
}

fn remap_refs(mut object: Object, id_offset: u32) -> Object {
    shift_refs(&mut object, id_offset);
    object
}

fn shift_refs(object: &mut Object, id_offset: u32) {
    match object {
        Object::Reference(ref mut id) => {
            id.0 += id_offset;
        }
        Object::Array(ref mut items) => {
            for item in items.iter_mut() {
                shift_refs(item, id_offset);
            }
        }
        Object::Dictionary(ref mut dict) => {
            for (_, value) in dict.iter_mut() {
                shift_refs(value, id_offset);
            }
        }
        Object::Stream(ref mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                shift_refs(value, id_offset);
            }
        }
        _ => {}
    }
}

/// Points the root /Pages node at the combined page list and reparents every
/// page to it.
fn rebuild_page_tree(doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| PdfMarkError::PageTree(format!("trailer root: {e}")))?;
    let pages_id = doc
        .get_object(catalog_id)
        .and_then(Object::as_dict)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| PdfMarkError::PageTree(format!("catalog pages: {e}")))?;

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    match doc.objects.get_mut(&pages_id) {
        Some(Object::Dictionary(ref mut pages_dict)) => {
            pages_dict.set("Kids", Object::Array(kids));
            pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
        }
        _ => {
            return Err(PdfMarkError::PageTree(
                "pages node is not a dictionary".to_string(),
            ))
        }
    }

    for &page_id in page_ids {
        if let Some(Object::Dictionary(ref mut page_dict)) = doc.objects.get_mut(&page_id) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }
    }
    Ok(())
}
