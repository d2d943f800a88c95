pub mod locate;
pub mod pdftotext;

use serde::{Deserialize, Serialize};

use crate::error::CustomsError;

/// Axis-aligned rectangle in page space: points, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// A single word of the text layer with its glyph box.
#[derive(Debug, Clone)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
}

/// A visual line of words, in reading order.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub words: Vec<Word>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Text layer of a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page ordinal.
    pub page_number: usize,
    pub width: f32,
    pub height: f32,
    pub lines: Vec<TextLine>,
}

impl PageContent {
    /// Raw text layer: words joined by spaces, lines by newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Trait for PDF backends: text layer with glyph boxes, plus page rasterization.
pub trait PdfBackend: Send + Sync {
    /// Extract the text layer of every page, one PageContent per page, in order.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, CustomsError>;

    /// Render one page (1-based) to PNG at the given resolution.
    fn render_page_png(
        &self,
        pdf_bytes: &[u8],
        page_number: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, CustomsError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
