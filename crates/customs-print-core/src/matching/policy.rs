use serde::{Deserialize, Serialize};

use crate::extraction::locate::TermLocator;
use crate::extraction::BoundingBox;
use crate::matching::proximity::within_distance;

/// Page predicate selected by the active search criteria.
///
/// Terms keep the case the user typed them in: text containment is tested
/// case-insensitively, box lookup uses the term verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchPolicy {
    /// Page contains the term.
    Single(String),
    /// Page contains at least one of the terms.
    AnyOf(Vec<String>),
    /// Page contains every term.
    AllOf(Vec<String>),
    /// Page contains every term, and some occurrence of `anchor` lies within
    /// `max_distance` points of some occurrence of `target`.
    AllOfWithProximity {
        anchor: String,
        target: String,
        others: Vec<String>,
        max_distance: f32,
    },
}

/// Result of evaluating one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum PageVerdict {
    /// The page qualifies; every box listed gets highlighted.
    Matched { highlights: Vec<BoundingBox> },
    /// Required terms missing from the page text.
    Absent { terms: Vec<String> },
    /// Terms present in the text but without any visual occurrence.
    Unlocatable { terms: Vec<String> },
    /// All terms located, but the anchor and target are too far apart.
    TooFarApart {
        anchor: String,
        target: String,
        max_distance: f32,
    },
}

impl PageVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, PageVerdict::Matched { .. })
    }

    pub fn highlights(&self) -> &[BoundingBox] {
        match self {
            PageVerdict::Matched { highlights } => highlights,
            _ => &[],
        }
    }
}

impl MatchPolicy {
    /// Every term of the policy, in configuration order.
    pub fn terms(&self) -> Vec<&str> {
        match self {
            MatchPolicy::Single(term) => vec![term.as_str()],
            MatchPolicy::AnyOf(terms) | MatchPolicy::AllOf(terms) => {
                terms.iter().map(String::as_str).collect()
            }
            MatchPolicy::AllOfWithProximity {
                anchor,
                target,
                others,
                ..
            } => {
                let mut terms = vec![anchor.as_str()];
                terms.extend(others.iter().map(String::as_str));
                terms.push(target.as_str());
                terms
            }
        }
    }

    /// Decide whether a page matches.
    ///
    /// `text` is the lowercase page text. The locator is only consulted for
    /// terms that passed the text test.
    pub fn evaluate(&self, text: &str, locator: &dyn TermLocator) -> PageVerdict {
        match self {
            MatchPolicy::Single(term) => evaluate_all(text, locator, &[term.as_str()]),
            MatchPolicy::AnyOf(terms) => evaluate_any(text, locator, terms),
            MatchPolicy::AllOf(terms) => {
                let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
                evaluate_all(text, locator, &terms)
            }
            MatchPolicy::AllOfWithProximity {
                anchor,
                target,
                max_distance,
                ..
            } => {
                let terms = self.terms();
                if let Some(missing) = absent_terms(text, &terms) {
                    return missing;
                }

                let located = match locate_all(locator, &terms) {
                    Ok(located) => located,
                    Err(verdict) => return verdict,
                };

                // anchor is first, target is last in `terms()`
                let anchor_boxes = &located[0];
                let target_boxes = &located[located.len() - 1];
                if !within_distance(anchor_boxes, target_boxes, *max_distance) {
                    return PageVerdict::TooFarApart {
                        anchor: anchor.clone(),
                        target: target.clone(),
                        max_distance: *max_distance,
                    };
                }

                PageVerdict::Matched {
                    highlights: located.into_iter().flatten().collect(),
                }
            }
        }
    }
}

fn contains_term(text: &str, term: &str) -> bool {
    text.contains(&term.to_lowercase())
}

fn absent_terms(text: &str, terms: &[&str]) -> Option<PageVerdict> {
    let missing: Vec<String> = terms
        .iter()
        .filter(|term| !contains_term(text, term))
        .map(|term| term.to_string())
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(PageVerdict::Absent { terms: missing })
    }
}

/// Boxes per term, or an `Unlocatable` verdict naming every term without boxes.
fn locate_all(
    locator: &dyn TermLocator,
    terms: &[&str],
) -> Result<Vec<Vec<BoundingBox>>, PageVerdict> {
    let located: Vec<Vec<BoundingBox>> = terms.iter().map(|t| locator.find_boxes(t)).collect();

    let unlocatable: Vec<String> = terms
        .iter()
        .zip(&located)
        .filter(|(_, boxes)| boxes.is_empty())
        .map(|(term, _)| term.to_string())
        .collect();

    if unlocatable.is_empty() {
        Ok(located)
    } else {
        Err(PageVerdict::Unlocatable { terms: unlocatable })
    }
}

fn evaluate_all(text: &str, locator: &dyn TermLocator, terms: &[&str]) -> PageVerdict {
    if let Some(missing) = absent_terms(text, terms) {
        return missing;
    }
    match locate_all(locator, terms) {
        Ok(located) => PageVerdict::Matched {
            highlights: located.into_iter().flatten().collect(),
        },
        Err(verdict) => verdict,
    }
}

fn evaluate_any(text: &str, locator: &dyn TermLocator, terms: &[String]) -> PageVerdict {
    let present: Vec<&String> = terms.iter().filter(|t| contains_term(text, t)).collect();
    if present.is_empty() {
        return PageVerdict::Absent {
            terms: terms.to_vec(),
        };
    }

    let mut highlights = Vec::new();
    let mut unlocatable = Vec::new();
    for term in present {
        let boxes = locator.find_boxes(term);
        if boxes.is_empty() {
            unlocatable.push(term.clone());
        } else {
            highlights.extend(boxes);
        }
    }

    if highlights.is_empty() {
        PageVerdict::Unlocatable { terms: unlocatable }
    } else {
        PageVerdict::Matched { highlights }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::proximity::cm_to_points;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Locator backed by a fixed term -> boxes table that records lookups.
    struct TableLocator {
        boxes: HashMap<&'static str, Vec<BoundingBox>>,
        lookups: RefCell<Vec<String>>,
    }

    impl TableLocator {
        fn new(entries: &[(&'static str, Vec<BoundingBox>)]) -> Self {
            TableLocator {
                boxes: entries.iter().cloned().collect(),
                lookups: RefCell::new(Vec::new()),
            }
        }
    }

    impl TermLocator for TableLocator {
        fn find_boxes(&self, term: &str) -> Vec<BoundingBox> {
            self.lookups.borrow_mut().push(term.to_string());
            self.boxes.get(term).cloned().unwrap_or_default()
        }
    }

    fn at(x: f32) -> BoundingBox {
        BoundingBox::new(x, 100.0, x + 40.0, 112.0)
    }

    #[test]
    fn test_single_match_highlights_all_occurrences() {
        let locator = TableLocator::new(&[("12345678", vec![at(10.0), at(300.0)])]);
        let policy = MatchPolicy::Single("12345678".into());
        let verdict = policy.evaluate("item 12345678 qty 2 ... 12345678", &locator);
        assert_eq!(verdict.highlights().len(), 2);
    }

    #[test]
    fn test_single_text_test_is_case_insensitive() {
        let locator = TableLocator::new(&[("AB-77", vec![at(10.0)])]);
        let policy = MatchPolicy::Single("AB-77".into());
        assert!(policy.evaluate("part ab-77 blue", &locator).is_match());
    }

    #[test]
    fn test_single_absent_skips_locator() {
        let locator = TableLocator::new(&[("12345678", vec![at(10.0)])]);
        let policy = MatchPolicy::Single("12345678".into());
        let verdict = policy.evaluate("unrelated page text", &locator);
        assert_eq!(
            verdict,
            PageVerdict::Absent {
                terms: vec!["12345678".into()]
            }
        );
        assert!(locator.lookups.borrow().is_empty());
    }

    #[test]
    fn test_single_present_but_unlocatable_is_rejected() {
        let locator = TableLocator::new(&[]);
        let policy = MatchPolicy::Single("12345678".into());
        let verdict = policy.evaluate("item 12345678", &locator);
        assert!(matches!(verdict, PageVerdict::Unlocatable { .. }));
    }

    #[test]
    fn test_any_of_unions_locatable_terms() {
        let locator = TableLocator::new(&[("111", vec![at(10.0)]), ("333", vec![at(90.0)])]);
        let policy = MatchPolicy::AnyOf(vec!["111".into(), "222".into(), "333".into()]);
        let verdict = policy.evaluate("items 111 222 333", &locator);
        // 222 is in the text but has no boxes; it contributes nothing
        assert_eq!(verdict.highlights(), &[at(10.0), at(90.0)]);
    }

    #[test]
    fn test_any_of_single_unlocatable_term_does_not_match() {
        let locator = TableLocator::new(&[("333", vec![at(90.0)])]);
        let policy = MatchPolicy::AnyOf(vec!["222".into(), "333".into()]);
        let verdict = policy.evaluate("items 222 only", &locator);
        assert_eq!(
            verdict,
            PageVerdict::Unlocatable {
                terms: vec!["222".into()]
            }
        );
    }

    #[test]
    fn test_any_of_adding_terms_is_monotonic() {
        let locator = TableLocator::new(&[("111", vec![at(10.0)]), ("444", vec![at(50.0)])]);
        let text = "items 111 and 444";
        let narrow = MatchPolicy::AnyOf(vec!["111".into()]);
        let wide = MatchPolicy::AnyOf(vec!["999".into(), "111".into(), "444".into()]);
        assert!(narrow.evaluate(text, &locator).is_match());
        assert!(wide.evaluate(text, &locator).is_match());
    }

    #[test]
    fn test_all_of_requires_every_term() {
        let locator = TableLocator::new(&[("8471", vec![at(10.0)]), ("5678", vec![at(200.0)])]);
        let policy = MatchPolicy::AllOf(vec!["8471".into(), "china".into(), "5678".into()]);

        let verdict = policy.evaluate("hs 8471 item 5678", &locator);
        assert_eq!(
            verdict,
            PageVerdict::Absent {
                terms: vec!["china".into()]
            }
        );
        assert!(locator.lookups.borrow().is_empty());
    }

    #[test]
    fn test_all_of_rejects_when_any_term_unlocatable() {
        let locator = TableLocator::new(&[("8471", vec![at(10.0)])]);
        let policy = MatchPolicy::AllOf(vec!["8471".into(), "5678".into()]);
        let verdict = policy.evaluate("hs 8471 item 5678", &locator);
        assert_eq!(
            verdict,
            PageVerdict::Unlocatable {
                terms: vec!["5678".into()]
            }
        );
    }

    #[test]
    fn test_all_of_highlights_every_term() {
        let locator = TableLocator::new(&[
            ("8471", vec![at(10.0)]),
            ("China", vec![at(100.0)]),
            ("5678", vec![at(200.0), at(400.0)]),
        ]);
        let policy = MatchPolicy::AllOf(vec!["8471".into(), "China".into(), "5678".into()]);
        let verdict = policy.evaluate("hs 8471 origin china item 5678 5678", &locator);
        assert_eq!(verdict.highlights().len(), 4);
    }

    fn tariff_policy(max_cm: f32) -> MatchPolicy {
        MatchPolicy::AllOfWithProximity {
            anchor: "1234".into(),
            target: "5678".into(),
            others: vec!["China".into()],
            max_distance: cm_to_points(max_cm),
        }
    }

    #[test]
    fn test_proximity_rejects_distant_terms() {
        let ten_cm = cm_to_points(10.0);
        let locator = TableLocator::new(&[
            ("1234", vec![at(10.0)]),
            ("China", vec![at(60.0)]),
            ("5678", vec![at(50.0 + ten_cm)]),
        ]);
        let verdict = tariff_policy(6.0).evaluate("1234 china 5678", &locator);
        assert!(matches!(verdict, PageVerdict::TooFarApart { .. }));
    }

    #[test]
    fn test_proximity_ignores_other_terms_position() {
        let locator = TableLocator::new(&[
            ("1234", vec![at(10.0)]),
            ("China", vec![at(5000.0)]),
            ("5678", vec![at(100.0)]),
        ]);
        let verdict = tariff_policy(6.0).evaluate("1234 china 5678", &locator);
        assert_eq!(
            verdict.highlights(),
            &[at(10.0), at(5000.0), at(100.0)]
        );
    }

    #[test]
    fn test_proximity_requires_all_terms_first() {
        let locator = TableLocator::new(&[("1234", vec![at(10.0)]), ("5678", vec![at(60.0)])]);
        let verdict = tariff_policy(6.0).evaluate("1234 5678", &locator);
        assert!(matches!(verdict, PageVerdict::Absent { .. }));
    }

    #[test]
    fn test_terms_order() {
        assert_eq!(tariff_policy(6.0).terms(), vec!["1234", "China", "5678"]);
    }
}
