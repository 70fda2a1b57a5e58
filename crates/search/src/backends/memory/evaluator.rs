//! Predicate evaluation over JSON rows.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::search::{CompareOp, FieldTypeParser, Predicate, TextMode};
use crate::types::{FieldValue, NumberValue};

/// Returns true if the predicate is definitely true for the row.
pub fn matches(predicate: &Predicate, row: &Value) -> bool {
    evaluate(predicate, row) == Some(true)
}

/// Evaluates a predicate with three-valued logic; `None` is unknown.
pub fn evaluate(predicate: &Predicate, row: &Value) -> Option<bool> {
    match predicate {
        Predicate::And(children) => {
            let mut unknown = false;
            for child in children {
                match evaluate(child, row) {
                    Some(false) => return Some(false),
                    None => unknown = true,
                    Some(true) => {}
                }
            }
            if unknown { None } else { Some(true) }
        }
        Predicate::Or(children) => {
            let mut unknown = false;
            for child in children {
                match evaluate(child, row) {
                    Some(true) => return Some(true),
                    None => unknown = true,
                    Some(false) => {}
                }
            }
            if unknown { None } else { Some(false) }
        }
        Predicate::Not(child) => evaluate(child, row).map(|b| !b),
        Predicate::Compare { field, op, value } => {
            let ordering = compare_field(field_value(row, field)?, value);
            Some(match op {
                CompareOp::Eq => ordering == Some(Ordering::Equal),
                CompareOp::Ne => ordering.is_some_and(|o| o != Ordering::Equal),
                CompareOp::Lt => ordering == Some(Ordering::Less),
                CompareOp::Gt => ordering == Some(Ordering::Greater),
            })
        }
        Predicate::Range {
            field,
            lower,
            upper,
        } => {
            let current = field_value(row, field)?;
            let above = compare_field(current, lower).is_some_and(|o| o != Ordering::Less);
            let below = compare_field(current, upper).is_some_and(|o| o != Ordering::Greater);
            Some(above && below)
        }
        Predicate::In { field, values } => {
            let current = field_value(row, field)?;
            Some(
                values
                    .iter()
                    .any(|v| compare_field(current, v) == Some(Ordering::Equal)),
            )
        }
        Predicate::TextMatch { field, mode, text } => {
            let current = field_value(row, field)?;
            let Some(haystack) = current.as_str() else {
                return Some(false);
            };
            let haystack = haystack.to_uppercase();
            let needle = text.to_uppercase();
            Some(match mode {
                TextMode::Contains => haystack.contains(&needle),
                TextMode::StartsWith => haystack.starts_with(&needle),
                TextMode::EndsWith => haystack.ends_with(&needle),
            })
        }
        Predicate::IsNull { field } => Some(field_value(row, field).is_none()),
        Predicate::IsNotNull { field } => Some(field_value(row, field).is_some()),
    }
}

fn field_value<'a>(row: &'a Value, field: &str) -> Option<&'a Value> {
    row.get(field).filter(|v| !v.is_null())
}

/// Compares a stored JSON value with a typed filter value.
///
/// Values of incompatible kinds are unordered.
fn compare_field(stored: &Value, value: &FieldValue) -> Option<Ordering> {
    let stored = match (stored, value) {
        (Value::String(s), FieldValue::Text(_)) => FieldValue::Text(s.clone()),
        (Value::String(s), FieldValue::DateTime(_)) => FieldValue::DateTime(stored_date(s)?),
        (Value::Number(n), FieldValue::Number(_)) => FieldValue::Number(json_number(n)?),
        (Value::Bool(b), FieldValue::Boolean(_)) => FieldValue::Boolean(*b),
        _ => return None,
    };
    stored.compare(value)
}

/// Reads a stored date; zoned RFC 3339 text is compared in UTC.
fn stored_date(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| FieldTypeParser::parse_date(s).ok())
}

fn json_number(n: &serde_json::Number) -> Option<NumberValue> {
    if let Some(i) = n.as_i64() {
        Some(NumberValue::Long(i))
    } else {
        n.as_f64().map(NumberValue::Double)
    }
}

/// Orders two optional JSON values for sorting; null and missing sort first.
pub fn compare_json(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => match (json_number(x), json_number(y)) {
                (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}
