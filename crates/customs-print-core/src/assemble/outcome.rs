use serde::{Deserialize, Serialize};

use crate::matching::PageVerdict;
use crate::text_source::TextOrigin;

/// Why a file was not scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// File name marks a bill of entry.
    BoeDocument,
    /// File name does not contain the GIR.
    GirNotInName,
}

/// A file turned away by the file-name admission filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedFile {
    pub file_name: String,
    pub reason: Exclusion,
}

/// An admitted file that could not be processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// Evaluation of one scanned page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOutcome {
    pub file_name: String,
    pub page_number: usize,
    pub text_origin: TextOrigin,
    #[serde(flatten)]
    pub verdict: PageVerdict,
}

/// A page that matched, exported as an independent one-page PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPage {
    pub file_name: String,
    /// Page number in the source file (1-based).
    pub page_number: usize,
    pub highlight_count: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// The merged document handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledOutput {
    pub file_name: String,
    pub page_count: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Matched,
    NoMatch,
    InvalidInput,
    Failed,
}

/// Everything a run produced: status, diagnostics and the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    /// Human-readable status line(s).
    pub message: String,
    pub excluded_files: Vec<ExcludedFile>,
    pub skipped_files: Vec<SkippedFile>,
    pub pages: Vec<PageOutcome>,
    pub matched_pages: Vec<MatchedPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<AssembledOutput>,
}

impl RunReport {
    pub(crate) fn rejected(message: String) -> Self {
        RunReport {
            status: RunStatus::InvalidInput,
            message,
            excluded_files: Vec::new(),
            skipped_files: Vec::new(),
            pages: Vec::new(),
            matched_pages: Vec::new(),
            output: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Matched && self.output.is_some()
    }
}
