use customs_print_core::assemble::outcome::{RunReport, RunStatus};
use customs_print_core::assemble::SourceDocument;
use customs_print_core::criteria::{load_criteria, MatchCriteria, SearchTerms};
use customs_print_core::error::CustomsError;
use customs_print_core::ocr::OcrEngine;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::output;
use crate::SearchArgs;

pub fn run(
    inputs: Vec<PathBuf>,
    search: &SearchArgs,
    out_dir: &Path,
    output_format: &str,
    ocr_args: &crate::OcrArgs,
) -> Result<(), CustomsError> {
    let criteria = build_criteria(search)?;
    let paths = expand_inputs(&inputs)?;

    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        sources.push(SourceDocument::new(display_name(path), std::fs::read(path)?));
    }

    let backend = super::poppler()?;
    let ocr = super::ocr_client(ocr_args)?;
    let report = customs_print_core::extract_matching_pages(
        &sources,
        &criteria,
        &backend,
        ocr.as_ref().map(|c| c as &dyn OcrEngine),
    );

    let written = match &report.output {
        Some(assembled) => Some(write_atomically(out_dir, &assembled.file_name, &assembled.bytes)?),
        None => None,
    };

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print(&report),
    }

    if let Some(path) = written {
        eprintln!("Merged PDF written to {}", path.display());
    }
    report_status(&report)
}

/// Criteria from `--criteria FILE`, or assembled from the search flags.
fn build_criteria(search: &SearchArgs) -> Result<MatchCriteria, CustomsError> {
    if let Some(path) = &search.criteria {
        return load_criteria(path);
    }

    let gir = search.gir.clone().unwrap_or_default();
    let terms = if let Some(hs_code) = &search.hs_code {
        SearchTerms::Tariff {
            hs_code: hs_code.clone(),
            country: search.country.clone(),
            item_number: search.item_number.clone().unwrap_or_default(),
            max_distance_cm: search.max_distance_cm,
        }
    } else if search.all {
        SearchTerms::AllOf {
            terms: search.items.clone(),
        }
    } else if search.items.len() == 1 {
        SearchTerms::Single {
            term: search.items[0].clone(),
        }
    } else {
        SearchTerms::AnyOf {
            terms: search.items.clone(),
        }
    };

    Ok(MatchCriteria { gir, terms })
}

/// Explicit files keep argument order; directories expand to their PDF files
/// sorted by name.
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CustomsError> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_pdf(p))
                .collect();
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// File name as uploaded: the last path component.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Write through a temp file in the target directory so a partial output
/// file is never visible.
fn write_atomically(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, CustomsError> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(file_name);

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| CustomsError::Io(e.error))?;

    info!(path = %target.display(), bytes = bytes.len(), "output written");
    Ok(target)
}

/// Input problems and failed merges end the process with an error; finding
/// nothing does not.
fn report_status(report: &RunReport) -> Result<(), CustomsError> {
    match report.status {
        RunStatus::InvalidInput => Err(CustomsError::InvalidInput(report.message.clone())),
        RunStatus::Failed => Err(CustomsError::Extraction(report.message.clone())),
        RunStatus::Matched | RunStatus::NoMatch => Ok(()),
    }
}
