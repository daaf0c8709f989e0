//! Query evaluation
//!
//! Matching and ordering of JSON documents against a [`RichQuery`].

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::{RichQuery, SortDirection};
use crate::error::{Result, WalletError};

impl RichQuery {
    /// Reject operators the evaluator does not implement
    pub fn validate(&self) -> Result<()> {
        validate_selector(&self.selector)
    }

    /// Whether `doc` satisfies the selector
    pub fn matches(&self, doc: &Value) -> bool {
        selector_matches(&self.selector, doc)
    }

    /// Order two documents by the sort clause (`Equal` keeps input order)
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for order in &self.sort {
            for (field, direction) in order {
                let ord = compare_values(a.get(field), b.get(field));
                let ord = match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
        Ordering::Equal
    }
}

fn validate_selector(selector: &Map<String, Value>) -> Result<()> {
    for (field, condition) in selector {
        match field.as_str() {
            "$or" | "$and" => {
                let branches = condition.as_array().ok_or_else(|| {
                    WalletError::UnsupportedQuery(format!("{} expects an array", field))
                })?;
                for branch in branches {
                    let branch = branch.as_object().ok_or_else(|| {
                        WalletError::UnsupportedQuery(format!("{} branch must be an object", field))
                    })?;
                    validate_selector(branch)?;
                }
            }
            op if op.starts_with('$') => {
                return Err(WalletError::UnsupportedQuery(format!("operator {}", op)));
            }
            _ => {
                if let Value::Object(ops) = condition {
                    for op in ops.keys() {
                        if op != "$eq" {
                            return Err(WalletError::UnsupportedQuery(format!(
                                "operator {} on field {}",
                                op, field
                            )));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn selector_matches(selector: &Map<String, Value>, doc: &Value) -> bool {
    selector.iter().all(|(field, condition)| match field.as_str() {
        "$or" => branches(condition).any(|b| selector_matches(b, doc)),
        "$and" => branches(condition).all(|b| selector_matches(b, doc)),
        _ => {
            let expected = match condition {
                Value::Object(ops) => match ops.get("$eq") {
                    Some(v) => v,
                    None => return false,
                },
                other => other,
            };
            doc.get(field) == Some(expected)
        }
    })
}

fn branches(condition: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    condition
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

/// Missing sorts first, then numbers, then strings
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
