pub mod outcome;

use tracing::{debug, info, warn};

use crate::criteria::{ActiveSearch, InputProblem, MatchCriteria};
use crate::error::CustomsError;
use crate::extraction::PdfBackend;
use crate::ocr::OcrEngine;
use crate::pdf::highlight::PageExtractor;
use crate::pdf::merge::merge_documents;
use crate::text_source::PageTextSource;
use outcome::{
    AssembledOutput, ExcludedFile, Exclusion, MatchedPage, PageOutcome, RunReport, RunStatus,
    SkippedFile,
};

/// File-name marker of documents that are never scanned.
const EXCLUDED_MARKER: &str = "BOE";

/// An uploaded PDF: file name plus raw bytes.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        SourceDocument {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Decide from the file name alone whether a file gets scanned.
///
/// Names containing "BOE" in any case are refused first; then the GIR must
/// occur verbatim (case-sensitive) in the name.
pub fn admit(file_name: &str, gir: &str) -> Result<(), Exclusion> {
    if file_name.to_uppercase().contains(EXCLUDED_MARKER) {
        return Err(Exclusion::BoeDocument);
    }
    if !file_name.contains(gir) {
        return Err(Exclusion::GirNotInName);
    }
    Ok(())
}

/// Pages matched and evaluated in one file.
struct FileScan {
    pages: Vec<PageOutcome>,
    matched: Vec<MatchedPage>,
}

/// Drives page matching over a batch of files and merges the matches.
pub struct DocumentAssembler<'a> {
    backend: &'a dyn PdfBackend,
    text_source: PageTextSource<'a>,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(backend: &'a dyn PdfBackend, ocr: Option<&'a dyn OcrEngine>) -> Self {
        DocumentAssembler {
            backend,
            text_source: PageTextSource::new(backend, ocr),
        }
    }

    /// Validate the inputs and run the search. Input problems come back as
    /// an `InvalidInput` report without any file being opened.
    pub fn run(&self, sources: &[SourceDocument], criteria: &MatchCriteria) -> RunReport {
        if sources.is_empty() {
            return RunReport::rejected(InputProblem::NoFiles.to_string());
        }
        match criteria.validate() {
            Ok(search) => self.run_search(sources, &search),
            Err(problem) => RunReport::rejected(problem.to_string()),
        }
    }

    /// Scan every admitted file, in order, and merge the matched pages.
    pub fn run_search(&self, sources: &[SourceDocument], search: &ActiveSearch) -> RunReport {
        info!(
            files = sources.len(),
            gir = %search.gir,
            search = %search,
            backend = self.backend.backend_name(),
            "starting run"
        );

        let mut excluded_files = Vec::new();
        let mut skipped_files = Vec::new();
        let mut pages = Vec::new();
        let mut matched_pages = Vec::new();

        for source in sources {
            if let Err(reason) = admit(&source.file_name, &search.gir) {
                debug!(file = %source.file_name, ?reason, "file not admitted");
                excluded_files.push(ExcludedFile {
                    file_name: source.file_name.clone(),
                    reason,
                });
                continue;
            }

            match self.scan_file(source, search) {
                Ok(scan) => {
                    pages.extend(scan.pages);
                    matched_pages.extend(scan.matched);
                }
                Err(e) => {
                    warn!(file = %source.file_name, error = %e, "skipping file");
                    skipped_files.push(SkippedFile {
                        file_name: source.file_name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut report = RunReport {
            status: RunStatus::NoMatch,
            message: String::new(),
            excluded_files,
            skipped_files,
            pages,
            matched_pages,
            output: None,
        };

        if report.matched_pages.is_empty() {
            report.message = "No pages contained the entered search terms.".to_string();
        } else {
            let page_bytes: Vec<&[u8]> = report
                .matched_pages
                .iter()
                .map(|page| page.bytes.as_slice())
                .collect();
            match merge_documents(&page_bytes) {
                Ok(bytes) => {
                    report.status = RunStatus::Matched;
                    report.message =
                        format!("Found {} matching page(s).", report.matched_pages.len());
                    report.output = Some(AssembledOutput {
                        file_name: search.output_file_name(),
                        page_count: report.matched_pages.len(),
                        bytes,
                    });
                }
                Err(e) => {
                    report.status = RunStatus::Failed;
                    report.message = format!("Failed to assemble the output document: {e}");
                }
            }
        }

        for skipped in &report.skipped_files {
            report
                .message
                .push_str(&format!("\nSkipped {}: {}", skipped.file_name, skipped.reason));
        }

        info!(
            status = ?report.status,
            matched = report.matched_pages.len(),
            excluded = report.excluded_files.len(),
            skipped = report.skipped_files.len(),
            "run finished"
        );
        report
    }

    /// Evaluate every page of one file. Any error discards the whole file.
    fn scan_file(
        &self,
        source: &SourceDocument,
        search: &ActiveSearch,
    ) -> Result<FileScan, CustomsError> {
        let contents = self.backend.extract_pages(&source.bytes)?;
        let mut extractor: Option<PageExtractor> = None;
        let mut scan = FileScan {
            pages: Vec::with_capacity(contents.len()),
            matched: Vec::new(),
        };

        for page in &contents {
            let text = self.text_source.page_text(&source.bytes, page);
            let verdict = search.policy.evaluate(&text.text, page);
            debug!(
                file = %source.file_name,
                page = page.page_number,
                origin = ?text.origin,
                matched = verdict.is_match(),
                "page evaluated"
            );

            if verdict.is_match() {
                // parsed on the first match only
                if extractor.is_none() {
                    extractor = Some(PageExtractor::open(&source.bytes)?);
                }
                if let Some(extractor) = &extractor {
                    let highlights = verdict.highlights();
                    scan.matched.push(MatchedPage {
                        file_name: source.file_name.clone(),
                        page_number: page.page_number,
                        highlight_count: highlights.len(),
                        bytes: extractor.extract(page.page_number, highlights)?,
                    });
                }
            }

            scan.pages.push(PageOutcome {
                file_name: source.file_name.clone(),
                page_number: page.page_number,
                text_origin: text.origin,
                verdict,
            });
        }

        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boe_excluded_in_any_case() {
        assert_eq!(admit("BOE-5399.pdf", "5399"), Err(Exclusion::BoeDocument));
        assert_eq!(admit("invoice_boe_5399.pdf", "5399"), Err(Exclusion::BoeDocument));
        assert_eq!(admit("5399-Boe.PDF", "5399"), Err(Exclusion::BoeDocument));
    }

    #[test]
    fn test_gir_must_appear_verbatim() {
        assert_eq!(admit("Invoice-5399.pdf", "5399"), Ok(()));
        assert_eq!(admit("Invoice-5398.pdf", "5399"), Err(Exclusion::GirNotInName));
        assert_eq!(admit("inv-abc.pdf", "ABC"), Err(Exclusion::GirNotInName));
        assert_eq!(admit("inv-ABC.pdf", "ABC"), Ok(()));
    }

    #[test]
    fn test_boe_rule_wins_over_gir() {
        assert_eq!(admit("5399 BOE 5399.pdf", "5399"), Err(Exclusion::BoeDocument));
    }
}
