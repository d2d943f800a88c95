use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::CustomsError;
use crate::matching::{cm_to_points, MatchPolicy};

pub const MAX_ANY_OF_TERMS: usize = 10;
pub const MIN_ALL_OF_TERMS: usize = 2;
pub const MAX_ALL_OF_TERMS: usize = 4;

/// User-supplied search configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCriteria {
    /// Shipment reference; only used to admit files by name.
    pub gir: String,
    #[serde(flatten)]
    pub terms: SearchTerms,
}

/// Which terms to look for, and how they combine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchTerms {
    Single {
        term: String,
    },
    AnyOf {
        terms: Vec<String>,
    },
    AllOf {
        terms: Vec<String>,
    },
    /// HS code, country of origin and item number on the same page.
    Tariff {
        hs_code: String,
        #[serde(default)]
        country: Option<String>,
        item_number: String,
        /// Maximum HS-code-to-item-number gap, in centimetres.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_distance_cm: Option<f32>,
    },
}

/// Input problems reported to the user as a status, not as an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputProblem {
    #[error("No files uploaded.")]
    NoFiles,

    #[error("Please enter GIR Number.")]
    MissingGir,

    #[error("Please enter at least one Item Number.")]
    NoTerms,

    #[error("Please enter at most {max} Item Numbers (got {got}).")]
    TooManyTerms { max: usize, got: usize },

    #[error("Please enter between {min} and {max} required terms (got {got}).")]
    WrongTermCount { min: usize, max: usize, got: usize },

    #[error("Please enter the HS Code.")]
    MissingHsCode,

    #[error("Please enter the Item Number.")]
    MissingItemNumber,

    #[error("The proximity distance must be a positive number of centimetres.")]
    InvalidDistance,
}

/// Criteria after trimming and validation: ready to drive a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSearch {
    pub gir: String,
    pub policy: MatchPolicy,
}

impl ActiveSearch {
    /// Output file name encoding the search terms and the GIR:
    /// `CustomsPrint-<terms>-<gir>.pdf`, terms joined by `_`.
    pub fn output_file_name(&self) -> String {
        let terms: Vec<String> = self
            .policy
            .terms()
            .into_iter()
            .map(sanitize_file_component)
            .collect();
        format!(
            "CustomsPrint-{}-{}.pdf",
            terms.join("_"),
            sanitize_file_component(&self.gir)
        )
    }
}

impl fmt::Display for ActiveSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.policy {
            MatchPolicy::Single(term) => write!(f, "'{term}'"),
            MatchPolicy::AnyOf(terms) => write!(f, "any of [{}]", terms.join(", ")),
            MatchPolicy::AllOf(terms) => write!(f, "all of [{}]", terms.join(", ")),
            MatchPolicy::AllOfWithProximity {
                anchor,
                target,
                others,
                max_distance,
            } => {
                let mut all = vec![anchor.as_str()];
                all.extend(others.iter().map(String::as_str));
                all.push(target.as_str());
                write!(
                    f,
                    "all of [{}] with '{anchor}' within {max_distance:.1} pt of '{target}'",
                    all.join(", ")
                )
            }
        }
    }
}

impl MatchCriteria {
    /// Trim every field, drop empty terms and build the match policy.
    pub fn validate(&self) -> Result<ActiveSearch, InputProblem> {
        let gir = self.gir.trim();
        if gir.is_empty() {
            return Err(InputProblem::MissingGir);
        }

        let policy = match &self.terms {
            SearchTerms::Single { term } => {
                let term = term.trim();
                if term.is_empty() {
                    return Err(InputProblem::NoTerms);
                }
                MatchPolicy::Single(term.to_string())
            }
            SearchTerms::AnyOf { terms } => {
                let terms = clean_terms(terms);
                if terms.is_empty() {
                    return Err(InputProblem::NoTerms);
                }
                if terms.len() > MAX_ANY_OF_TERMS {
                    return Err(InputProblem::TooManyTerms {
                        max: MAX_ANY_OF_TERMS,
                        got: terms.len(),
                    });
                }
                MatchPolicy::AnyOf(terms)
            }
            SearchTerms::AllOf { terms } => {
                let terms = clean_terms(terms);
                if terms.is_empty() {
                    return Err(InputProblem::NoTerms);
                }
                if !(MIN_ALL_OF_TERMS..=MAX_ALL_OF_TERMS).contains(&terms.len()) {
                    return Err(InputProblem::WrongTermCount {
                        min: MIN_ALL_OF_TERMS,
                        max: MAX_ALL_OF_TERMS,
                        got: terms.len(),
                    });
                }
                MatchPolicy::AllOf(terms)
            }
            SearchTerms::Tariff {
                hs_code,
                country,
                item_number,
                max_distance_cm,
            } => {
                let hs_code = hs_code.trim();
                let item_number = item_number.trim();
                let country = country
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty());

                if hs_code.is_empty() && item_number.is_empty() && country.is_none() {
                    return Err(InputProblem::NoTerms);
                }
                if hs_code.is_empty() {
                    return Err(InputProblem::MissingHsCode);
                }
                if item_number.is_empty() {
                    return Err(InputProblem::MissingItemNumber);
                }

                match max_distance_cm {
                    Some(cm) if !(cm.is_finite() && *cm > 0.0) => {
                        return Err(InputProblem::InvalidDistance)
                    }
                    Some(cm) => MatchPolicy::AllOfWithProximity {
                        anchor: hs_code.to_string(),
                        target: item_number.to_string(),
                        others: country.map(str::to_string).into_iter().collect(),
                        max_distance: cm_to_points(*cm),
                    },
                    None => {
                        let mut terms = vec![hs_code.to_string()];
                        terms.extend(country.map(str::to_string));
                        terms.push(item_number.to_string());
                        MatchPolicy::AllOf(terms)
                    }
                }
            }
        };

        Ok(ActiveSearch {
            gir: gir.to_string(),
            policy,
        })
    }
}

fn clean_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replace characters that are not safe in file names.
fn sanitize_file_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Load criteria from a JSON file.
pub fn load_criteria(path: &Path) -> Result<MatchCriteria, CustomsError> {
    let content = std::fs::read_to_string(path).map_err(|e| CustomsError::CriteriaLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let criteria: MatchCriteria =
        serde_json::from_str(&content).map_err(|e| CustomsError::CriteriaLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    criteria
        .validate()
        .map_err(|problem| CustomsError::CriteriaInvalid(problem.to_string()))?;
    Ok(criteria)
}

/// Parse criteria from a JSON string (no file path context).
pub fn parse_criteria_str(json: &str) -> Result<MatchCriteria, CustomsError> {
    let criteria: MatchCriteria = serde_json::from_str(json)?;
    criteria
        .validate()
        .map_err(|problem| CustomsError::CriteriaInvalid(problem.to_string()))?;
    Ok(criteria)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(gir: &str, term: &str) -> MatchCriteria {
        MatchCriteria {
            gir: gir.into(),
            terms: SearchTerms::Single { term: term.into() },
        }
    }

    #[test]
    fn test_single_output_file_name() {
        let search = single(" 5399 ", " 12345678 ").validate().unwrap();
        assert_eq!(search.gir, "5399");
        assert_eq!(search.policy, MatchPolicy::Single("12345678".into()));
        assert_eq!(search.output_file_name(), "CustomsPrint-12345678-5399.pdf");
    }

    #[test]
    fn test_missing_gir_checked_before_terms() {
        assert_eq!(single("  ", "").validate(), Err(InputProblem::MissingGir));
        assert_eq!(single("5399", "   ").validate(), Err(InputProblem::NoTerms));
    }

    #[test]
    fn test_any_of_drops_blank_terms() {
        let criteria = MatchCriteria {
            gir: "5399".into(),
            terms: SearchTerms::AnyOf {
                terms: vec!["111".into(), "  ".into(), " 222 ".into(), "".into()],
            },
        };
        let search = criteria.validate().unwrap();
        assert_eq!(
            search.policy,
            MatchPolicy::AnyOf(vec!["111".into(), "222".into()])
        );
        assert_eq!(search.output_file_name(), "CustomsPrint-111_222-5399.pdf");
    }

    #[test]
    fn test_any_of_limits() {
        let blank = MatchCriteria {
            gir: "5399".into(),
            terms: SearchTerms::AnyOf {
                terms: vec![" ".into()],
            },
        };
        assert_eq!(blank.validate(), Err(InputProblem::NoTerms));

        let eleven = MatchCriteria {
            gir: "5399".into(),
            terms: SearchTerms::AnyOf {
                terms: (0..11).map(|i| format!("item{i}")).collect(),
            },
        };
        assert_eq!(
            eleven.validate(),
            Err(InputProblem::TooManyTerms { max: 10, got: 11 })
        );
    }

    #[test]
    fn test_all_of_term_count() {
        let one = MatchCriteria {
            gir: "5399".into(),
            terms: SearchTerms::AllOf {
                terms: vec!["111".into(), " ".into()],
            },
        };
        assert!(matches!(
            one.validate(),
            Err(InputProblem::WrongTermCount { got: 1, .. })
        ));
    }

    #[test]
    fn test_tariff_without_distance_is_all_of() {
        let criteria = MatchCriteria {
            gir: "5399".into(),
            terms: SearchTerms::Tariff {
                hs_code: "1234".into(),
                country: Some("China".into()),
                item_number: "5678".into(),
                max_distance_cm: None,
            },
        };
        let search = criteria.validate().unwrap();
        assert_eq!(
            search.policy,
            MatchPolicy::AllOf(vec!["1234".into(), "China".into(), "5678".into()])
        );
        assert_eq!(
            search.output_file_name(),
            "CustomsPrint-1234_China_5678-5399.pdf"
        );
    }

    #[test]
    fn test_tariff_with_distance_uses_hs_to_item_proximity() {
        let criteria = MatchCriteria {
            gir: "5399".into(),
            terms: SearchTerms::Tariff {
                hs_code: "1234".into(),
                country: Some("   ".into()),
                item_number: "5678".into(),
                max_distance_cm: Some(6.0),
            },
        };
        match criteria.validate().unwrap().policy {
            MatchPolicy::AllOfWithProximity {
                anchor,
                target,
                others,
                max_distance,
            } => {
                assert_eq!(anchor, "1234");
                assert_eq!(target, "5678");
                assert!(others.is_empty());
                assert!((max_distance - 170.079).abs() < 1e-3);
            }
            other => panic!("unexpected policy {other:?}"),
        }
    }

    #[test]
    fn test_tariff_rejects_bad_distance_and_missing_fields() {
        let mut terms = SearchTerms::Tariff {
            hs_code: "1234".into(),
            country: None,
            item_number: "5678".into(),
            max_distance_cm: Some(0.0),
        };
        let criteria = MatchCriteria {
            gir: "5399".into(),
            terms: terms.clone(),
        };
        assert_eq!(criteria.validate(), Err(InputProblem::InvalidDistance));

        if let SearchTerms::Tariff {
            ref mut hs_code,
            ref mut max_distance_cm,
            ..
        } = terms
        {
            *hs_code = " ".into();
            *max_distance_cm = None;
        }
        let criteria = MatchCriteria {
            gir: "5399".into(),
            terms,
        };
        assert_eq!(criteria.validate(), Err(InputProblem::MissingHsCode));
    }

    #[test]
    fn test_file_name_sanitized() {
        let search = single("GIR/53 99", "A:B*C").validate().unwrap();
        assert_eq!(search.output_file_name(), "CustomsPrint-A_B_C-GIR_53_99.pdf");
    }

    #[test]
    fn test_parse_criteria_json() {
        let json = r#"{
            "gir": "5399",
            "mode": "tariff",
            "hs_code": "1234",
            "country": "China",
            "item_number": "5678",
            "max_distance_cm": 6
        }"#;
        let criteria = parse_criteria_str(json).unwrap();
        assert_eq!(criteria.gir, "5399");
        assert!(matches!(
            criteria.terms,
            SearchTerms::Tariff {
                max_distance_cm: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_criteria_rejects_invalid() {
        let json = r#"{ "gir": "", "mode": "single", "term": "1" }"#;
        assert!(matches!(
            parse_criteria_str(json),
            Err(CustomsError::CriteriaInvalid(_))
        ));
        assert!(parse_criteria_str(r#"{ "gir": "1", "mode": "unknown" }"#).is_err());
    }
}
