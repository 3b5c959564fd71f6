//! Field coercion for raw store values.
//!
//! Every function here is total: values that cannot be interpreted come back
//! as `None`, never as an error. One malformed field must not abort a batch.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::types::{RawValue, MISSING_EXPIRATION_LABEL};

/// Timestamp layouts tried before plain dates. The time part is discarded.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Date layouts, in priority order. Month-first beats day-first for
/// ambiguous slash dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%m/%d/%y",
    "%d/%m/%y",
    "%d-%b-%y",
];

/// `%Y` accepts one to four digits, so a two-digit year would otherwise land
/// in the first century.
const MIN_YEAR: i32 = 1000;

/// Convert a decimal to the nearest `f64`.
///
/// Goes through the decimal string so the result is correctly rounded, the
/// same value a float literal with those digits would produce.
pub fn decimal_to_f64(value: &Decimal) -> Option<f64> {
    value.normalize().to_string().parse::<f64>().ok()
}

/// Coerce a raw value to a float. Unparseable values and NaN are missing.
pub fn coerce_f64(value: &RawValue) -> Option<f64> {
    let parsed = match value {
        RawValue::Number(d) => decimal_to_f64(d),
        RawValue::Text(s) => parse_f64(s),
        RawValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        RawValue::Null | RawValue::List(_) | RawValue::Map(_) => None,
    };
    parsed.filter(|v| !v.is_nan())
}

fn parse_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parse an expiration value into a calendar date.
///
/// Text goes through [`parse_date_str`]. Integral numbers with eight digits
/// are read as `YYYYMMDD`; any other number is missing.
pub fn parse_expiration(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Text(s) => parse_date_str(s),
        RawValue::Number(d) if d.fract().is_zero() => {
            let digits = d.trunc().normalize().to_string();
            if digits.len() == 8 && digits.bytes().all(|b| b.is_ascii_digit()) {
                NaiveDate::parse_from_str(&digits, "%Y%m%d").ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Permissive date parsing.
///
/// Accepts RFC 3339 timestamps (keeping the local calendar date), ISO-like
/// timestamps, and the date layouts in [`DATE_FORMATS`]. Matches with a
/// year below 1000 are skipped.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        let date = dt.naive_local().date();
        return (date.year() >= MIN_YEAR).then_some(date);
    }

    DATETIME_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
        .chain(
            DATE_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok()),
        )
        .find(|d| d.year() >= MIN_YEAR)
}

/// Canonical grouping label for an expiration.
pub fn expiration_label(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => MISSING_EXPIRATION_LABEL.to_string(),
    }
}
