pub mod assemble;
pub mod criteria;
pub mod error;
pub mod extraction;
pub mod matching;
pub mod ocr;
pub mod pdf;
pub mod text_source;

use assemble::outcome::RunReport;
use assemble::{DocumentAssembler, SourceDocument};
use criteria::MatchCriteria;
use extraction::PdfBackend;
use ocr::OcrEngine;

/// Main API entry point: find the pages of `sources` that match `criteria`,
/// highlight the matched terms and merge those pages into one PDF.
///
/// Files are admitted by name (no "BOE", must contain the GIR) and scanned
/// in the order given; the output keeps file order, then page order.
/// Pages whose text layer is nearly empty are read with `ocr` when one is
/// configured.
pub fn extract_matching_pages(
    sources: &[SourceDocument],
    criteria: &MatchCriteria,
    backend: &dyn PdfBackend,
    ocr: Option<&dyn OcrEngine>,
) -> RunReport {
    DocumentAssembler::new(backend, ocr).run(sources, criteria)
}
