//! Best-effort value coercions used when flattening orders.
//!
//! Nothing here fails. Each coercion reports whether it parsed the input or
//! fell back to a default, and why.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Output format of every timestamp written to the sheet.
pub const SHEET_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    /// Input was absent, `null` or empty.
    Missing,
    /// Input was present but could not be interpreted.
    Malformed,
}

/// Result of a coercion that cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    Parsed(T),
    Defaulted { value: T, reason: DefaultReason },
}

impl<T> Coerced<T> {
    fn missing(value: T) -> Self {
        Coerced::Defaulted {
            value,
            reason: DefaultReason::Missing,
        }
    }

    fn malformed(value: T) -> Self {
        Coerced::Defaulted {
            value,
            reason: DefaultReason::Malformed,
        }
    }

    pub fn value(self) -> T {
        match self {
            Coerced::Parsed(value) | Coerced::Defaulted { value, .. } => value,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Coerced::Defaulted {
                reason: DefaultReason::Malformed,
                ..
            }
        )
    }
}

/// Coerces a monetary amount. Accepts JSON numbers and numeric strings using
/// either `.` or `,` as decimal separator. Anything else is `0.0`.
pub fn coerce_money(value: &Value) -> Coerced<f64> {
    match value {
        Value::Null => Coerced::missing(0.0),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Coerced::Parsed(f),
            _ => Coerced::malformed(0.0),
        },
        Value::String(s) if s.trim().is_empty() => Coerced::missing(0.0),
        Value::String(s) => match s.trim().replace(',', ".").parse::<f64>() {
            Ok(f) if f.is_finite() => Coerced::Parsed(f),
            _ => Coerced::malformed(0.0),
        },
        _ => Coerced::malformed(0.0),
    }
}

/// Coerces a line-item quantity. Missing or unparseable quantities count as 0.
pub fn coerce_quantity(value: &Value) -> Coerced<i64> {
    match value {
        Value::Null => Coerced::missing(0),
        Value::Bool(b) => Coerced::Parsed(i64::from(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Coerced::Parsed(i),
            (None, Some(f)) if f.is_finite() && f.abs() < i64::MAX as f64 => {
                Coerced::Parsed(f.trunc() as i64)
            }
            _ => Coerced::malformed(0),
        },
        Value::String(s) if s.trim().is_empty() => Coerced::missing(0),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Coerced::Parsed)
            .unwrap_or_else(|_| Coerced::malformed(0)),
        _ => Coerced::malformed(0),
    }
}

/// Parses an ISO-8601 date or datetime, keeping the wall-clock time of its
/// own offset. A `Z` designator is read as `+00:00`.
pub fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    let normalized = raw.trim().replace('Z', "+00:00");
    if normalized.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.naive_local());
    }

    const WITH_OFFSET: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
    ];
    for format in WITH_OFFSET {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Some(dt.naive_local());
        }
    }

    const NAIVE: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn format_sheet_datetime(dt: &NaiveDateTime) -> String {
    dt.format(SHEET_DATETIME_FORMAT).to_string()
}

/// Formats a standard order timestamp. Absent or unparseable input is empty.
pub fn format_timestamp(raw: Option<&str>) -> Coerced<String> {
    match raw.map(str::trim) {
        None | Some("") => Coerced::missing(String::new()),
        Some(s) => match parse_iso_datetime(s) {
            Some(dt) => Coerced::Parsed(format_sheet_datetime(&dt)),
            None => Coerced::malformed(String::new()),
        },
    }
}
