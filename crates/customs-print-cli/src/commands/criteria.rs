use customs_print_core::criteria::{load_criteria, MatchCriteria, SearchTerms};
use customs_print_core::error::CustomsError;
use std::path::Path;

pub fn validate(path: &Path) -> Result<(), CustomsError> {
    let criteria = load_criteria(path)?;
    let search = criteria
        .validate()
        .map_err(|problem| CustomsError::CriteriaInvalid(problem.to_string()))?;

    println!("Criteria file is valid: {}", path.display());
    println!("  GIR:    {}", search.gir);
    println!("  Search: {search}");
    println!("  Output: {}", search.output_file_name());
    Ok(())
}

pub fn example() -> Result<(), CustomsError> {
    for (title, criteria) in examples() {
        println!("// {title}");
        println!("{}\n", serde_json::to_string_pretty(&criteria)?);
    }
    Ok(())
}

fn examples() -> Vec<(&'static str, MatchCriteria)> {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        (
            "One item number",
            MatchCriteria {
                gir: "5399".to_string(),
                terms: SearchTerms::Single {
                    term: "12345678".to_string(),
                },
            },
        ),
        (
            "Any of up to 10 item numbers",
            MatchCriteria {
                gir: "5399".to_string(),
                terms: SearchTerms::AnyOf {
                    terms: strings(&["12345678", "87654321"]),
                },
            },
        ),
        (
            "All of 2 to 4 terms on the same page",
            MatchCriteria {
                gir: "5399".to_string(),
                terms: SearchTerms::AllOf {
                    terms: strings(&["12345678", "Germany"]),
                },
            },
        ),
        (
            "HS code near the item number",
            MatchCriteria {
                gir: "5399".to_string(),
                terms: SearchTerms::Tariff {
                    hs_code: "8471.30".to_string(),
                    country: Some("China".to_string()),
                    item_number: "12345678".to_string(),
                    max_distance_cm: Some(6.0),
                },
            },
        ),
    ]
}
