use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::CustomsError;
use crate::extraction::BoundingBox;
use crate::pdf::{compose, page_id, save, PageFrame};

/// Highlight colour (RGB, yellow).
const HIGHLIGHT_COLOR: [f32; 3] = [1.0, 1.0, 0.0];

/// Annotation flag: print the annotation with the page.
const ANNOTATION_FLAG_PRINT: i64 = 4;

/// Exports single highlighted pages of one source document.
///
/// The source is parsed once; every export works on its own copy, so the
/// original bytes and the parsed original stay untouched.
pub struct PageExtractor {
    original: Document,
}

impl PageExtractor {
    pub fn open(pdf_bytes: &[u8]) -> Result<Self, CustomsError> {
        Ok(PageExtractor {
            original: Document::load_mem(pdf_bytes)?,
        })
    }

    pub fn page_count(&self) -> usize {
        self.original.get_pages().len()
    }

    /// Highlight `boxes` on page `page_number` (1-based) and return that page
    /// alone as a new one-page PDF.
    pub fn extract(
        &self,
        page_number: usize,
        boxes: &[BoundingBox],
    ) -> Result<Vec<u8>, CustomsError> {
        let mut working = self.original.clone();
        let page = page_id(&working, page_number)?;
        let frame = PageFrame::of(&working, page);

        let annotations: Vec<Object> = boxes
            .iter()
            .map(|bbox| Object::Reference(add_highlight(&mut working, page, frame.to_pdf_rect(bbox))))
            .collect();
        append_annotations(&mut working, page, annotations)?;

        let mut single = compose(&[(&working, page)])?;
        save(&mut single)
    }
}

fn real_array(values: &[f32]) -> Vec<Object> {
    values.iter().map(|v| Object::Real(*v)).collect()
}

/// Add a highlight annotation object covering `rect` and return its id.
///
/// The annotation carries QuadPoints for interactive viewers and an
/// appearance stream so it also renders when printed.
fn add_highlight(doc: &mut Document, page: ObjectId, rect: [f32; 4]) -> ObjectId {
    let [x0, y0, x1, y1] = rect;

    let appearance = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => real_array(&rect),
            "Resources" => dictionary! {
                "ExtGState" => dictionary! {
                    "GS0" => dictionary! {
                        "Type" => "ExtGState",
                        "BM" => "Multiply",
                    },
                },
            },
        },
        format!(
            "/GS0 gs {} {} {} rg {x0} {y0} {} {} re f",
            HIGHLIGHT_COLOR[0],
            HIGHLIGHT_COLOR[1],
            HIGHLIGHT_COLOR[2],
            x1 - x0,
            y1 - y0
        )
        .into_bytes(),
    );
    let appearance_id = doc.add_object(appearance);

    doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => real_array(&rect),
        "QuadPoints" => real_array(&[x0, y1, x1, y1, x0, y0, x1, y0]),
        "C" => real_array(&HIGHLIGHT_COLOR),
        "F" => ANNOTATION_FLAG_PRINT,
        "P" => page,
        "AP" => dictionary! { "N" => appearance_id },
    })
}

/// Append annotation references to the page's `/Annots`, which may be
/// missing, inline, or an indirect array.
fn append_annotations(
    doc: &mut Document,
    page: ObjectId,
    annotations: Vec<Object>,
) -> Result<(), CustomsError> {
    if annotations.is_empty() {
        return Ok(());
    }

    let existing = doc.get_dictionary(page)?.get(b"Annots").ok().cloned();
    match existing {
        Some(Object::Reference(array_id)) => {
            let array = doc.get_object_mut(array_id)?.as_array_mut()?;
            array.extend(annotations);
        }
        Some(Object::Array(mut array)) => {
            array.extend(annotations);
            doc.get_dictionary_mut(page)?.set("Annots", array);
        }
        _ => {
            doc.get_dictionary_mut(page)?.set("Annots", annotations);
        }
    }
    Ok(())
}
