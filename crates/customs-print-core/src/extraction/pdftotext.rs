use crate::error::CustomsError;
use crate::extraction::{BoundingBox, PageContent, PdfBackend, TextLine, Word};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::{Command, Output};

/// PDF backend using the poppler utilities.
///
/// `pdftotext -bbox-layout` provides the text layer together with word boxes,
/// `pdftoppm` rasterizes pages for the OCR fallback.
pub struct PopplerBackend;

impl PopplerBackend {
    pub fn new() -> Self {
        PopplerBackend
    }

    /// Check if pdftotext and pdftoppm are available on the system.
    pub fn is_available() -> bool {
        ["pdftotext", "pdftoppm"].iter().all(|tool| {
            Command::new(tool)
                .arg("-v")
                .output()
                .map(|o| o.status.success() || !o.stderr.is_empty())
                .unwrap_or(false)
        })
    }
}

impl Default for PopplerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBackend for PopplerBackend {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, CustomsError> {
        let tmpfile = write_temp_pdf(pdf_bytes)?;

        let mut command = Command::new("pdftotext");
        command.arg("-bbox-layout").arg(tmpfile.path()).arg("-");
        let output = run_tool("pdftotext", &mut command)?;

        let xml = String::from_utf8_lossy(&output.stdout);
        parse_bbox_layout(&xml)
    }

    fn render_page_png(
        &self,
        pdf_bytes: &[u8],
        page_number: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, CustomsError> {
        let workdir = tempfile::tempdir()?;
        let pdf_path = workdir.path().join("source.pdf");
        std::fs::write(&pdf_path, pdf_bytes)?;
        let output_root = workdir.path().join("page");

        let mut command = Command::new("pdftoppm");
        command
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-singlefile")
            .arg("-png")
            .arg(&pdf_path)
            .arg(&output_root);
        run_tool("pdftoppm", &mut command)?;

        let png_path = output_root.with_extension("png");
        if !png_path.exists() {
            return Err(CustomsError::Extraction(format!(
                "pdftoppm did not produce an image for page {page_number}"
            )));
        }
        Ok(std::fs::read(png_path)?)
    }

    fn backend_name(&self) -> &str {
        "poppler"
    }
}

fn write_temp_pdf(pdf_bytes: &[u8]) -> Result<tempfile::NamedTempFile, CustomsError> {
    let mut tmpfile =
        tempfile::NamedTempFile::new().map_err(|e| CustomsError::Extraction(e.to_string()))?;
    tmpfile
        .write_all(pdf_bytes)
        .map_err(|e| CustomsError::Extraction(e.to_string()))?;
    Ok(tmpfile)
}

fn run_tool(tool: &'static str, command: &mut Command) -> Result<Output, CustomsError> {
    let output = command.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CustomsError::ToolNotFound(tool)
        } else {
            CustomsError::Extraction(format!("{tool} failed: {e}"))
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(CustomsError::ToolFailed { tool, code, stderr });
    }

    Ok(output)
}

/// Parse the XHTML produced by `pdftotext -bbox-layout`.
///
/// Every `<page>` element yields a page, including pages without any words,
/// so page ordinals line up with the document.
pub(crate) fn parse_bbox_layout(xml: &str) -> Result<Vec<PageContent>, CustomsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages = Vec::new();
    let mut current_page: Option<PageContent> = None;
    let mut current_line: Option<TextLine> = None;
    let mut current_word: Option<(BoundingBox, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| CustomsError::Extraction(format!("malformed pdftotext output: {e}")))?;

        match event {
            Event::Start(tag) => match tag.name().as_ref() {
                b"page" => {
                    current_page = Some(PageContent {
                        page_number: pages.len() + 1,
                        width: attr_f32(&tag, b"width").unwrap_or_default(),
                        height: attr_f32(&tag, b"height").unwrap_or_default(),
                        lines: Vec::new(),
                    });
                }
                b"line" => current_line = Some(TextLine::default()),
                b"word" => {
                    current_word = parse_bbox(&tag).map(|bbox| (bbox, String::new()));
                }
                _ => {}
            },
            Event::Empty(tag) if tag.name().as_ref() == b"page" => {
                pages.push(PageContent {
                    page_number: pages.len() + 1,
                    width: attr_f32(&tag, b"width").unwrap_or_default(),
                    height: attr_f32(&tag, b"height").unwrap_or_default(),
                    lines: Vec::new(),
                });
            }
            Event::Text(text) => {
                if let Some((_, ref mut word_text)) = current_word {
                    let unescaped = text.unescape().map_err(|e| {
                        CustomsError::Extraction(format!("bad entity in word text: {e}"))
                    })?;
                    word_text.push_str(&unescaped);
                }
            }
            Event::End(tag) => match tag.name().as_ref() {
                b"word" => {
                    if let (Some((bbox, text)), Some(line)) =
                        (current_word.take(), current_line.as_mut())
                    {
                        let text = text.trim();
                        if !text.is_empty() {
                            line.words.push(Word {
                                text: text.to_string(),
                                bbox,
                            });
                        }
                    }
                }
                b"line" => {
                    if let (Some(line), Some(page)) = (current_line.take(), current_page.as_mut())
                    {
                        if !line.words.is_empty() {
                            page.lines.push(line);
                        }
                    }
                }
                b"page" => {
                    if let Some(page) = current_page.take() {
                        pages.push(page);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

fn attr_f32(tag: &BytesStart<'_>, name: &[u8]) -> Option<f32> {
    tag.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| String::from_utf8_lossy(&attr.value).trim().parse().ok())
}

fn parse_bbox(tag: &BytesStart<'_>) -> Option<BoundingBox> {
    Some(BoundingBox {
        x_min: attr_f32(tag, b"xMin")?,
        y_min: attr_f32(tag, b"yMin")?,
        x_max: attr_f32(tag, b"xMax")?,
        y_max: attr_f32(tag, b"yMax")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title></title>
<meta name="Producer" content="Invoice Generator"/>
</head>
<body>
<doc>
  <page width="595.000000" height="842.000000">
    <flow>
      <block xMin="56.0" yMin="70.0" xMax="300.0" yMax="95.0">
        <line xMin="56.0" yMin="70.0" xMax="210.0" yMax="82.0">
          <word xMin="56.0" yMin="70.0" xMax="120.0" yMax="82.0">Commercial</word>
          <word xMin="124.0" yMin="70.0" xMax="170.0" yMax="82.0">Invoice</word>
        </line>
        <line xMin="56.0" yMin="84.0" xMax="200.0" yMax="95.0">
          <word xMin="56.0" yMin="84.0" xMax="100.0" yMax="95.0">Smith&amp;Co</word>
        </line>
      </block>
    </flow>
  </page>
  <page width="595.000000" height="842.000000">
  </page>
</doc>
</body>
</html>
"#;

    #[test]
    fn test_parse_bbox_layout_pages_lines_words() {
        let pages = parse_bbox_layout(SAMPLE).unwrap();
        assert_eq!(pages.len(), 2);

        let first = &pages[0];
        assert_eq!(first.page_number, 1);
        assert_eq!(first.width, 595.0);
        assert_eq!(first.lines.len(), 2);
        assert_eq!(first.lines[0].words[1].text, "Invoice");
        assert_eq!(first.lines[0].words[1].bbox.x_min, 124.0);
        assert_eq!(first.text(), "Commercial Invoice\nSmith&Co");
    }

    #[test]
    fn test_parse_bbox_layout_keeps_empty_pages() {
        let pages = parse_bbox_layout(SAMPLE).unwrap();
        assert_eq!(pages[1].page_number, 2);
        assert!(pages[1].lines.is_empty());
        assert_eq!(pages[1].text(), "");
    }

    #[test]
    fn test_parse_bbox_layout_empty_document() {
        let pages = parse_bbox_layout("<doc></doc>").unwrap();
        assert!(pages.is_empty());
    }
}
