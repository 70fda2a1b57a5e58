//! Typed scalar values produced by the field type parser.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::field::FieldType;

/// A parsed numeric value.
///
/// The variant records which step of the numeric cascade accepted the text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum NumberValue {
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// Double precision float.
    Double(f64),
    /// Arbitrary precision decimal.
    Decimal(Decimal),
}

impl NumberValue {
    /// Returns the value as an `f64`, possibly losing precision.
    pub fn as_f64(&self) -> f64 {
        match self {
            NumberValue::Int(v) => f64::from(*v),
            NumberValue::Long(v) => *v as f64,
            NumberValue::Double(v) => *v,
            NumberValue::Decimal(v) => v.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Returns the value as an `i64` if it is an integer variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumberValue::Int(v) => Some(i64::from(*v)),
            NumberValue::Long(v) => Some(*v),
            NumberValue::Double(_) | NumberValue::Decimal(_) => None,
        }
    }

    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            NumberValue::Int(v) => Some(Decimal::from(*v)),
            NumberValue::Long(v) => Some(Decimal::from(*v)),
            NumberValue::Decimal(v) => Some(*v),
            NumberValue::Double(_) => None,
        }
    }

    /// Compares two numbers by magnitude regardless of variant.
    pub fn compare(&self, other: &NumberValue) -> Option<Ordering> {
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberValue::Int(v) => write!(f, "{}", v),
            NumberValue::Long(v) => write!(f, "{}", v),
            // Debug keeps the fractional part and uses exponents for extreme magnitudes
            NumberValue::Double(v) => write!(f, "{:?}", v),
            NumberValue::Decimal(v) => write!(f, "{}", v),
        }
    }
}

/// A filter value converted to the scalar its field type requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    /// Text, passed through unchanged.
    Text(String),
    /// A number.
    Number(NumberValue),
    /// A date-time without zone.
    DateTime(NaiveDateTime),
    /// A boolean.
    Boolean(bool),
}

impl FieldValue {
    /// Returns the field type this value belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Text(_) => FieldType::String,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::DateTime(_) => FieldType::Date,
            FieldValue::Boolean(_) => FieldType::Boolean,
        }
    }

    /// Returns the text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Compares two values of the same kind.
    ///
    /// Values of different kinds are unordered.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.compare(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            FieldValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Number(NumberValue::Int(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(NumberValue::Long(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(NumberValue::Double(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::DateTime(v)
    }
}
