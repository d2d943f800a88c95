use crate::error::CustomsError;
use crate::ocr::{OcrEngine, OcrSettings};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Deserialize;

/// OCR engine backed by the OCR.space HTTP API.
///
/// Each call is a single multipart POST bounded by the configured timeout.
/// No retries are made.
pub struct OcrSpaceClient {
    client: Client,
    settings: OcrSettings,
}

impl OcrSpaceClient {
    pub fn new(settings: OcrSettings) -> Result<Self, CustomsError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(OcrSpaceClient { client, settings })
    }

    fn form(&self, png: &[u8]) -> Result<Form, CustomsError> {
        let image = Part::bytes(png.to_vec())
            .file_name("page.png")
            .mime_str("image/png")?;

        Ok(Form::new()
            .text("apikey", self.settings.api_key.clone())
            .text("language", self.settings.language.clone())
            .text("OCREngine", "1")
            .text("scale", "true")
            .text("detectOrientation", "true")
            .part("file", image))
    }
}

impl OcrEngine for OcrSpaceClient {
    fn recognize(&self, png: &[u8]) -> Result<String, CustomsError> {
        let response = self
            .client
            .post(&self.settings.endpoint)
            .multipart(self.form(png)?)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(CustomsError::OcrResponse(format!(
                "HTTP {status}: {}",
                body.trim()
            )));
        }
        parse_response(&body)
    }

    fn engine_name(&self) -> &str {
        "ocr.space"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    parsed_text: Option<String>,
}

/// Extract the recognized text of the first parsed result.
pub(crate) fn parse_response(body: &str) -> Result<String, CustomsError> {
    let response: OcrSpaceResponse = serde_json::from_str(body)
        .map_err(|e| CustomsError::OcrResponse(format!("invalid JSON: {e}")))?;

    if response.is_errored_on_processing {
        let message = match response.error_message {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "unknown error".to_string(),
        };
        return Err(CustomsError::OcrProcessing(message));
    }

    response
        .parsed_results
        .and_then(|results| results.into_iter().next())
        .and_then(|first| first.parsed_text)
        .ok_or_else(|| CustomsError::OcrResponse("missing ParsedResults[0].ParsedText".into()))
}
