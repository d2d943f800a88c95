pub mod criteria;
pub mod extract;
pub mod inspect;

use customs_print_core::error::CustomsError;
use customs_print_core::extraction::pdftotext::PopplerBackend;
use customs_print_core::ocr::ocr_space::OcrSpaceClient;
use customs_print_core::ocr::OcrSettings;
use std::time::Duration;
use tracing::warn;

use crate::OcrArgs;

/// Poppler backend, or an error when its tools are not installed.
fn poppler() -> Result<PopplerBackend, CustomsError> {
    if !PopplerBackend::is_available() {
        return Err(CustomsError::ToolNotFound("pdftotext/pdftoppm"));
    }
    Ok(PopplerBackend::new())
}

/// OCR client for the given flags; `None` when OCR is off or has no key.
fn ocr_client(args: &OcrArgs) -> Result<Option<OcrSpaceClient>, CustomsError> {
    if args.no_ocr {
        return Ok(None);
    }
    let Some(api_key) = args.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        warn!("no OCR API key configured; scanned pages will not be read");
        return Ok(None);
    };

    let mut settings = OcrSettings::new(api_key.trim());
    settings.endpoint = args.endpoint.clone();
    settings.language = args.language.clone();
    settings.timeout = Duration::from_secs(args.timeout_secs.max(1));
    OcrSpaceClient::new(settings).map(Some)
}
