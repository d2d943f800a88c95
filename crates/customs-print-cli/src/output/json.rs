use customs_print_core::assemble::outcome::RunReport;
use customs_print_core::error::CustomsError;

pub fn print(report: &RunReport) -> Result<(), CustomsError> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}
