pub mod ocr_space;

use crate::error::CustomsError;
use std::time::Duration;

/// Remote or local text recognition from a rendered page image.
pub trait OcrEngine: Send + Sync {
    /// Recognize the text of a PNG image.
    fn recognize(&self, png: &[u8]) -> Result<String, CustomsError>;

    /// Name of this engine (for diagnostics).
    fn engine_name(&self) -> &str;
}

pub const DEFAULT_ENDPOINT: &str = "https://api.ocr.space/parse/image";
pub const DEFAULT_LANGUAGE: &str = "eng";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for the OCR service.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub api_key: String,
    pub endpoint: String,
    pub language: String,
    pub timeout: Duration,
}

impl OcrSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        OcrSettings {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
