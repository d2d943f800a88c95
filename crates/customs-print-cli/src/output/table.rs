use customs_print_core::assemble::outcome::{Exclusion, RunReport};
use customs_print_core::matching::PageVerdict;

pub fn print(report: &RunReport) {
    println!("{}\n", report.message);

    if !report.excluded_files.is_empty() {
        println!("Not scanned:");
        for file in &report.excluded_files {
            let reason = match file.reason {
                Exclusion::BoeDocument => "bill of entry",
                Exclusion::GirNotInName => "GIR not in file name",
            };
            println!("  {}  ({reason})", file.file_name);
        }
        println!();
    }

    if !report.pages.is_empty() {
        let name_width = report
            .pages
            .iter()
            .map(|p| p.file_name.len())
            .max()
            .unwrap_or(10);

        println!("Pages:");
        for page in &report.pages {
            println!(
                "  {:<width$}  p.{:<3}  {:<16} {}",
                page.file_name,
                page.page_number,
                format!("{:?}", page.text_origin),
                describe(&page.verdict),
                width = name_width
            );
        }
        println!();
    }

    if let Some(output) = &report.output {
        println!("Output: {} ({} page(s))", output.file_name, output.page_count);
        for page in &report.matched_pages {
            println!(
                "  {} p.{}  {} highlight(s)",
                page.file_name, page.page_number, page.highlight_count
            );
        }
    }
}

fn describe(verdict: &PageVerdict) -> String {
    match verdict {
        PageVerdict::Matched { highlights } => format!("MATCH ({} highlight(s))", highlights.len()),
        PageVerdict::Absent { terms } => format!("-  missing: {}", terms.join(", ")),
        PageVerdict::Unlocatable { terms } => {
            format!("-  in text but not on page: {}", terms.join(", "))
        }
        PageVerdict::TooFarApart {
            anchor,
            target,
            max_distance,
        } => format!("-  '{anchor}' and '{target}' more than {max_distance:.1} pt apart"),
    }
}
