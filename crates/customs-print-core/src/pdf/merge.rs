use lopdf::Document;

use crate::error::CustomsError;
use crate::pdf::{compose, save};

/// Concatenate PDFs page by page, keeping the order given.
pub fn merge_documents<B: AsRef<[u8]>>(documents: &[B]) -> Result<Vec<u8>, CustomsError> {
    let loaded = documents
        .iter()
        .map(|bytes| Document::load_mem(bytes.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let pages: Vec<_> = loaded
        .iter()
        .flat_map(|doc| doc.get_pages().into_values().map(move |id| (doc, id)))
        .collect();

    let mut merged = compose(&pages)?;
    merged.compress();
    save(&mut merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{build_pdf, page_widths};

    #[test]
    fn test_merge_keeps_input_order() {
        let docs = vec![
            build_pdf(&[700]),
            build_pdf(&[500, 510]),
            build_pdf(&[600]),
        ];
        let merged = merge_documents(&docs).unwrap();
        assert_eq!(page_widths(&merged), vec![700, 500, 510, 600]);
    }

    #[test]
    fn test_merge_same_document_twice() {
        let page = build_pdf(&[640]);
        let merged = merge_documents(&[page.clone(), page]).unwrap();
        assert_eq!(page_widths(&merged), vec![640, 640]);
    }

    #[test]
    fn test_merge_fails_on_corrupt_input() {
        let docs = vec![build_pdf(&[600]), b"not a pdf".to_vec()];
        assert!(merge_documents(&docs).is_err());
    }
}
