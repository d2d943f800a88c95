use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extraction::{PageContent, PdfBackend};
use crate::ocr::OcrEngine;

/// Text layers shorter than this (after trimming) are treated as scanned pages.
pub const MIN_TEXT_LAYER_CHARS: usize = 10;

/// Resolution used when rasterizing a page for OCR.
pub const OCR_RENDER_DPI: u32 = 300;

/// Where the effective text of a page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOrigin {
    TextLayer,
    Ocr,
    /// OCR was attempted and failed; the page has no text.
    OcrFailed,
    /// The text layer was too short and no OCR engine is configured; the
    /// short text layer is kept as is.
    OcrUnavailable,
}

/// Best-effort page text: lowercase and trimmed.
#[derive(Debug, Clone)]
pub struct PageText {
    pub text: String,
    pub origin: TextOrigin,
}

/// Direct text-layer extraction with an OCR fallback for near-empty pages.
pub struct PageTextSource<'a> {
    backend: &'a dyn PdfBackend,
    ocr: Option<&'a dyn OcrEngine>,
}

impl<'a> PageTextSource<'a> {
    pub fn new(backend: &'a dyn PdfBackend, ocr: Option<&'a dyn OcrEngine>) -> Self {
        PageTextSource { backend, ocr }
    }

    /// Text of `page` of the document `pdf_bytes`. Never fails: any OCR
    /// problem degrades to empty text.
    pub fn page_text(&self, pdf_bytes: &[u8], page: &PageContent) -> PageText {
        let direct = page.text().to_lowercase().trim().to_string();
        if direct.chars().count() >= MIN_TEXT_LAYER_CHARS {
            return PageText {
                text: direct,
                origin: TextOrigin::TextLayer,
            };
        }

        let Some(ocr) = self.ocr else {
            debug!(
                page = page.page_number,
                "text layer too short and OCR is disabled"
            );
            return PageText {
                text: direct,
                origin: TextOrigin::OcrUnavailable,
            };
        };

        let recognized = self
            .backend
            .render_page_png(pdf_bytes, page.page_number, OCR_RENDER_DPI)
            .and_then(|png| ocr.recognize(&png));

        match recognized {
            Ok(text) => {
                debug!(
                    page = page.page_number,
                    engine = ocr.engine_name(),
                    chars = text.len(),
                    "page text recognized by OCR"
                );
                PageText {
                    text: text.to_lowercase().trim().to_string(),
                    origin: TextOrigin::Ocr,
                }
            }
            Err(e) => {
                warn!(
                    page = page.page_number,
                    engine = ocr.engine_name(),
                    error = %e,
                    "OCR fallback failed, treating page as empty"
                );
                PageText {
                    text: String::new(),
                    origin: TextOrigin::OcrFailed,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CustomsError;
    use crate::extraction::{BoundingBox, TextLine, Word};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubBackend {
        renders: AtomicUsize,
    }

    impl PdfBackend for StubBackend {
        fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageContent>, CustomsError> {
            Ok(vec![])
        }

        fn render_page_png(
            &self,
            _pdf_bytes: &[u8],
            _page_number: usize,
            dpi: u32,
        ) -> Result<Vec<u8>, CustomsError> {
            assert_eq!(dpi, OCR_RENDER_DPI);
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(b"\x89PNG".to_vec())
        }

        fn backend_name(&self) -> &str {
            "stub"
        }
    }

    struct StubOcr {
        result: Result<&'static str, &'static str>,
    }

    impl OcrEngine for StubOcr {
        fn recognize(&self, _png: &[u8]) -> Result<String, CustomsError> {
            self.result
                .map(str::to_string)
                .map_err(|e| CustomsError::OcrProcessing(e.to_string()))
        }

        fn engine_name(&self) -> &str {
            "stub"
        }
    }

    fn page_with_text(text: &str) -> PageContent {
        PageContent {
            page_number: 3,
            width: 612.0,
            height: 792.0,
            lines: vec![TextLine {
                words: text
                    .split_whitespace()
                    .map(|w| Word {
                        text: w.to_string(),
                        bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                    })
                    .collect(),
            }],
        }
    }

    fn backend() -> StubBackend {
        StubBackend {
            renders: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_text_layer_used_without_ocr_call() {
        let backend = backend();
        let ocr = StubOcr {
            result: Ok("never"),
        };
        let source = PageTextSource::new(&backend, Some(&ocr));

        let text = source.page_text(b"%PDF", &page_with_text("Commercial INVOICE 5399"));
        assert_eq!(text.text, "commercial invoice 5399");
        assert_eq!(text.origin, TextOrigin::TextLayer);
        assert_eq!(backend.renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_exactly_ten_chars_is_enough() {
        let backend = backend();
        let source = PageTextSource::new(&backend, None);
        let text = source.page_text(b"%PDF", &page_with_text("0123456789"));
        assert_eq!(text.origin, TextOrigin::TextLayer);
    }

    #[test]
    fn test_short_text_falls_back_to_ocr() {
        let backend = backend();
        let ocr = StubOcr {
            result: Ok("  Item NO 12345678\r\n"),
        };
        let source = PageTextSource::new(&backend, Some(&ocr));

        let text = source.page_text(b"%PDF", &page_with_text("p. 3"));
        assert_eq!(text.text, "item no 12345678");
        assert_eq!(text.origin, TextOrigin::Ocr);
        assert_eq!(backend.renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ocr_failure_degrades_to_empty_text() {
        let backend = backend();
        let ocr = StubOcr {
            result: Err("E500: service unavailable"),
        };
        let source = PageTextSource::new(&backend, Some(&ocr));

        let text = source.page_text(b"%PDF", &page_with_text(""));
        assert_eq!(text.text, "");
        assert_eq!(text.origin, TextOrigin::OcrFailed);
    }

    #[test]
    fn test_no_ocr_engine_keeps_short_text_layer() {
        let backend = backend();
        let source = PageTextSource::new(&backend, None);
        let text = source.page_text(b"%PDF", &page_with_text("Ref 5678"));
        assert_eq!(text.text, "ref 5678");
        assert_eq!(text.origin, TextOrigin::OcrUnavailable);
        assert_eq!(backend.renders.load(Ordering::SeqCst), 0);
    }
}
