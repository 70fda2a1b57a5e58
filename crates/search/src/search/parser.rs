//! Conversion of textual filter values into typed scalars.
//!
//! - BOOLEAN is permissive: anything other than `true` (any case) is false.
//! - DATE tries a fixed list of formats in order; a bare date is midnight.
//! - NUMBER picks the integer or floating branch on the presence of a `.`,
//!   then widens: `i32`, `i64`, `f64`, [`Decimal`].
//! - STRING passes through.
//!
//! DATE and NUMBER failures are reported as [`ParseError`]; there is no
//! fallback value.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::ParseError;
use crate::types::{FieldType, FieldValue, NumberValue};

/// Date-time layouts tried in order after the ISO forms.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// ISO calendar date layout.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Most significant digits an `f64` round-trips through its shortest text form.
const MAX_DOUBLE_DIGITS: usize = 17;

/// Converts filter values to the scalar required by a field type.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldTypeParser;

impl FieldTypeParser {
    /// Parses a value for the given field type.
    pub fn parse(value: &str, field_type: FieldType) -> Result<FieldValue, ParseError> {
        match field_type {
            FieldType::String => Ok(FieldValue::Text(value.to_string())),
            FieldType::Boolean => Ok(FieldValue::Boolean(Self::parse_boolean(value))),
            FieldType::Date => Self::parse_date(value).map(FieldValue::DateTime),
            FieldType::Number => Self::parse_number(value).map(FieldValue::Number),
        }
    }

    /// Parses a boolean; only `true` in any case yields true.
    pub fn parse_boolean(value: &str) -> bool {
        value.trim().eq_ignore_ascii_case("true")
    }

    /// Parses a date or date-time.
    pub fn parse_date(value: &str) -> Result<NaiveDateTime, ParseError> {
        let trimmed = value.trim();

        for format in DATE_TIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(dt);
            }
        }

        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|_| ParseError::InvalidDate {
                value: value.to_string(),
            })
    }

    /// Parses a number through the integer or floating cascade.
    pub fn parse_number(value: &str) -> Result<NumberValue, ParseError> {
        let trimmed = value.trim();
        let invalid = || ParseError::InvalidNumber {
            value: value.to_string(),
        };

        if !trimmed.contains('.') {
            if let Ok(v) = trimmed.parse::<i32>() {
                return Ok(NumberValue::Int(v));
            }
            if let Ok(v) = trimmed.parse::<i64>() {
                return Ok(NumberValue::Long(v));
            }
        }

        let double = trimmed.parse::<f64>().ok().filter(|v| v.is_finite());
        if let Some(v) = double {
            if significant_digits(trimmed) <= MAX_DOUBLE_DIGITS {
                return Ok(NumberValue::Double(v));
            }
        }

        if let Some(d) = parse_decimal(trimmed) {
            return Ok(NumberValue::Decimal(d));
        }

        double.map(NumberValue::Double).ok_or_else(invalid)
    }

    /// Returns true if the value is a calendar date with no time part.
    pub fn is_date_without_time(value: &str) -> bool {
        let bytes = value.as_bytes();
        bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            })
    }

    /// Returns the inclusive range covering a date-only value's whole day.
    ///
    /// The range ends one nanosecond before the next midnight.
    pub fn whole_day(value: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
        if !Self::is_date_without_time(value) {
            return None;
        }
        let date = NaiveDate::parse_from_str(value, DATE_FORMAT).ok()?;
        let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)?;
        Some((date.and_time(NaiveTime::MIN), date.and_time(end_of_day)))
    }
}

/// Counts significant mantissa digits, ignoring sign, leading and trailing zeros.
fn significant_digits(text: &str) -> usize {
    let mantissa = text.split(['e', 'E']).next().unwrap_or(text);
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}
