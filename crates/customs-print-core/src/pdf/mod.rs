//! Page-level PDF editing on top of `lopdf`.
//!
//! Pages are never edited in the caller's bytes: a working copy is parsed,
//! annotated, and the wanted pages are deep-copied into a fresh document.

pub mod highlight;
pub mod merge;

use std::collections::BTreeMap;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::error::CustomsError;
use crate::extraction::BoundingBox;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a page tree has no MediaBox at all.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Object id of page `page_number` (1-based).
pub(crate) fn page_id(doc: &Document, page_number: usize) -> Result<ObjectId, CustomsError> {
    let pages = doc.get_pages();
    u32::try_from(page_number)
        .ok()
        .and_then(|n| pages.get(&n).copied())
        .ok_or(CustomsError::PageOutOfRange {
            page: page_number,
            count: pages.len(),
        })
}

/// Look up `key` on the page or, failing that, on its page-tree ancestors.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn rectangle(doc: &Document, object: &Object) -> Option<[f32; 4]> {
    let object = match object {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values = object.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, value) in rect.iter_mut().zip(values) {
        *slot = value.as_float().ok()?;
    }
    Some([
        rect[0].min(rect[2]),
        rect[1].min(rect[3]),
        rect[0].max(rect[2]),
        rect[1].max(rect[3]),
    ])
}

/// Page geometry needed to place boxes measured on the displayed page: the
/// MediaBox in PDF user space (origin bottom-left) and the page rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageFrame {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
    /// Clockwise display rotation: 0, 90, 180 or 270.
    pub rotation: i64,
}

impl PageFrame {
    /// Frame of a page. Text boxes from `pdftotext` are relative to the
    /// MediaBox, so the CropBox plays no part here.
    pub(crate) fn of(doc: &Document, page_id: ObjectId) -> PageFrame {
        let rect = inherited(doc, page_id, b"MediaBox")
            .and_then(|o| rectangle(doc, o))
            .unwrap_or(DEFAULT_MEDIA_BOX);
        let rotation = inherited(doc, page_id, b"Rotate")
            .and_then(|o| o.as_i64().ok())
            .map(|r| r.rem_euclid(360))
            .filter(|r| r % 90 == 0)
            .unwrap_or(0);
        PageFrame {
            left: rect[0],
            bottom: rect[1],
            right: rect[2],
            top: rect[3],
            rotation,
        }
    }

    /// Map a point of the displayed page (origin top-left, y down) into user space.
    fn to_user_space(&self, x: f32, y: f32) -> (f32, f32) {
        match self.rotation {
            90 => (self.left + y, self.bottom + x),
            180 => (self.right - x, self.bottom + y),
            270 => (self.right - y, self.top - x),
            _ => (self.left + x, self.top - y),
        }
    }

    /// Convert a displayed-page box into a PDF rectangle `[x0, y0, x1, y1]`.
    pub(crate) fn to_pdf_rect(&self, bbox: &BoundingBox) -> [f32; 4] {
        let (ax, ay) = self.to_user_space(bbox.x_min, bbox.y_min);
        let (bx, by) = self.to_user_space(bbox.x_max, bbox.y_max);
        [ax.min(bx), ay.min(by), ax.max(bx), ay.max(by)]
    }
}

/// Copy of a page dictionary with inherited attributes made explicit and
/// the link to its old page tree removed.
fn standalone_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary, CustomsError> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    for key in INHERITABLE {
        if !page.has(key) {
            if let Some(value) = inherited(doc, page_id, key) {
                page.set(key.to_vec(), value.clone());
            }
        }
    }
    if !page.has(b"MediaBox") {
        page.set(
            "MediaBox",
            DEFAULT_MEDIA_BOX
                .iter()
                .map(|v| Object::Real(*v))
                .collect::<Vec<_>>(),
        );
    }
    page.remove(b"Parent");
    Ok(page)
}

/// Deep copy of the objects reachable from one page into a target document.
struct PageCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    page_id: ObjectId,
    ids: BTreeMap<ObjectId, ObjectId>,
}

impl PageCopier<'_> {
    fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(*id),
            Object::Array(items) => Object::Array(items.iter().map(|o| self.copy_object(o)).collect()),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.copy_dictionary(&stream.dict);
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.copy_object(value));
        }
        copy
    }

    fn copy_reference(&mut self, id: ObjectId) -> Object {
        if let Some(new_id) = self.ids.get(&id) {
            return Object::Reference(*new_id);
        }
        let source = self.source;
        let Ok(object) = source.get_object(id) else {
            return Object::Null;
        };
        // Links into other pages or the old page tree are dropped.
        if id != self.page_id && is_page_tree_node(object) {
            return Object::Null;
        }

        let new_id = self.target.new_object_id();
        self.ids.insert(id, new_id);
        let copy = self.copy_object(object);
        self.target.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    matches!(object.type_name(), Ok("Page") | Ok("Pages"))
}

/// Build a new document holding the given pages, in order.
pub(crate) fn compose(pages: &[(&Document, ObjectId)]) -> Result<Document, CustomsError> {
    let mut out = Document::with_version("1.5");
    let pages_id = out.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for &(source, page_id) in pages {
        let page = standalone_page(source, page_id)?;
        let new_page_id = out.new_object_id();

        let mut copier = PageCopier {
            source,
            target: &mut out,
            page_id,
            ids: BTreeMap::from([(page_id, new_page_id)]),
        };
        let mut page = copier.copy_dictionary(&page);
        page.set("Parent", pages_id);
        out.objects.insert(new_page_id, Object::Dictionary(page));
        kids.push(Object::Reference(new_page_id));
    }

    let count = kids.len() as i64;
    out.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = out.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    out.trailer.set("Root", catalog_id);
    Ok(out)
}

pub(crate) fn save(doc: &mut Document) -> Result<Vec<u8>, CustomsError> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Number of pages in a serialized PDF.
pub fn page_count(pdf_bytes: &[u8]) -> Result<usize, CustomsError> {
    Ok(Document::load_mem(pdf_bytes)?.get_pages().len())
}
