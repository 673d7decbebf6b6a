use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Raw cell spellings treated as null when loading a delimited file.
pub const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "null", "None"];

pub fn is_null_marker(raw: &str) -> bool {
    NULL_MARKERS.contains(&raw)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view used by range checks and outlier statistics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Parses a timestamp string into UTC. Zoned inputs (RFC 3339 or any
/// offset-bearing spelling) are converted; bare inputs are accepted as
/// already-UTC only when `assume_utc` is set.
pub fn parse_utc_datetime(value: &str, assume_utc: bool) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(parsed.with_timezone(&Utc));
    }
    if assume_utc {
        let naive = parse_naive_datetime(trimmed)?;
        return Ok(naive.and_utc());
    }
    Err(anyhow!("Failed to parse '{value}' as zoned datetime"))
}

/// Lenient float coercion: whitespace-tolerant, `None` on any parse failure.
pub fn coerce_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Lenient integer coercion. Accepts integral float spellings ("2.0") the
/// way a numeric-then-integer cast does, rejects fractional ones ("2.5").
pub fn coerce_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    let as_float: f64 = trimmed.parse().ok()?;
    if as_float.is_finite() && as_float.fract() == 0.0 {
        Some(as_float as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn null_markers_match_exact_spellings() {
        assert!(is_null_marker(""));
        assert!(is_null_marker("NA"));
        assert!(is_null_marker("N/A"));
        assert!(is_null_marker("null"));
        assert!(is_null_marker("None"));
        assert!(!is_null_marker("na"));
        assert!(!is_null_marker("0"));
    }

    #[test]
    fn parse_naive_datetime_supports_multiple_formats() {
        let expected =
            NaiveDateTime::parse_from_str("2024-05-06 14:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(
            parse_naive_datetime("2024-05-06T14:30:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_naive_datetime("06/05/2024 14:30:00").unwrap(),
            expected
        );
        assert_eq!(parse_naive_datetime("2024-05-06 14:30").unwrap(), expected);
    }

    #[test]
    fn parse_utc_datetime_converts_offsets() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
        assert_eq!(
            parse_utc_datetime("2024-01-05T10:00:00Z", true).unwrap(),
            expected
        );
        assert_eq!(
            parse_utc_datetime("2024-01-05T12:00:00+02:00", true).unwrap(),
            expected
        );
        assert_eq!(
            parse_utc_datetime("2024-01-05 10:00:00", true).unwrap(),
            expected
        );
        assert!(parse_utc_datetime("2024-01-05 10:00:00", false).is_err());
        assert!(parse_utc_datetime("not a date", true).is_err());
    }

    #[test]
    fn coerce_float_recovers_to_none() {
        assert_eq!(coerce_float("10.5"), Some(10.5));
        assert_eq!(coerce_float(" 3 "), Some(3.0));
        assert_eq!(coerce_float("abc"), None);
        assert_eq!(coerce_float("NaN"), None);
    }

    #[test]
    fn coerce_int_accepts_integral_floats_only() {
        assert_eq!(coerce_int("2"), Some(2));
        assert_eq!(coerce_int("2.0"), Some(2));
        assert_eq!(coerce_int("2.5"), None);
        assert_eq!(coerce_int("two"), None);
    }

    #[test]
    fn value_display_is_round_trip_friendly() {
        assert_eq!(Value::Float(10.0).as_display(), "10");
        assert_eq!(Value::Float(10.5).as_display(), "10.5");
        let ts = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).as_display(), "2024-01-05T10:00:00Z");
    }
}
