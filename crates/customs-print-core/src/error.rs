use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CustomsError {
    #[error("PDF text extraction failed: {0}")]
    Extraction(String),

    #[error("{0} not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    ToolNotFound(&'static str),

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("page {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("PDF structure error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("OCR request failed: {0}")]
    OcrTransport(#[from] reqwest::Error),

    #[error("OCR service reported a processing error: {0}")]
    OcrProcessing(String),

    #[error("unexpected OCR response: {0}")]
    OcrResponse(String),

    #[error("failed to load criteria from {path}: {reason}")]
    CriteriaLoad { path: PathBuf, reason: String },

    #[error("invalid criteria: {0}")]
    CriteriaInvalid(String),

    /// Missing or unusable run input, worded for the user as is.
    #[error("{0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
