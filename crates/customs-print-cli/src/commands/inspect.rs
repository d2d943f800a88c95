use customs_print_core::error::CustomsError;
use customs_print_core::extraction::locate::TermLocator;
use customs_print_core::extraction::PdfBackend;
use customs_print_core::ocr::OcrEngine;
use customs_print_core::text_source::PageTextSource;
use std::path::PathBuf;

use crate::OcrArgs;

pub fn run(input_file: PathBuf, terms: &[String], ocr_args: &OcrArgs) -> Result<(), CustomsError> {
    let pdf_bytes = std::fs::read(&input_file)?;
    let backend = super::poppler()?;
    let ocr = super::ocr_client(ocr_args)?;
    let text_source = PageTextSource::new(&backend, ocr.as_ref().map(|c| c as &dyn OcrEngine));

    let pages = backend.extract_pages(&pdf_bytes)?;
    println!("{} ({} page(s))\n", input_file.display(), pages.len());

    for page in &pages {
        let text = text_source.page_text(&pdf_bytes, page);
        println!(
            "  Page {:<3} {:>6} chars  [{:?}]  {:.0} x {:.0} pt",
            page.page_number,
            text.text.chars().count(),
            text.origin,
            page.width,
            page.height
        );

        for term in terms {
            let in_text = text.text.contains(&term.to_lowercase());
            let boxes = page.find_boxes(term);
            print!(
                "    {:<20} text: {:<3}  boxes: {}",
                term,
                if in_text { "yes" } else { "no" },
                boxes.len()
            );
            for b in &boxes {
                print!("  ({:.1}, {:.1})-({:.1}, {:.1})", b.x_min, b.y_min, b.x_max, b.y_max);
            }
            println!();
        }
    }

    Ok(())
}
