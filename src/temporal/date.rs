//! Date normalization
//!
//! Coerces the date-like values a chart front end sends back (ISO strings or
//! epoch milliseconds) into a calendar date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{ChartPrepError, Result};

/// Naive datetime layouts accepted in addition to RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts: ISO and the compact form produced by day-level group filters.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// A date-like value supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateValue {
    /// ISO-8601 date or datetime string
    Text(String),
    /// Milliseconds since the Unix epoch (UTC)
    EpochMillis(i64),
}

impl From<&str> for DateValue {
    fn from(value: &str) -> Self {
        DateValue::Text(value.to_string())
    }
}

impl From<String> for DateValue {
    fn from(value: String) -> Self {
        DateValue::Text(value)
    }
}

impl From<i64> for DateValue {
    fn from(value: i64) -> Self {
        DateValue::EpochMillis(value)
    }
}

impl TryFrom<&serde_json::Value> for DateValue {
    type Error = ChartPrepError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(DateValue::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(DateValue::EpochMillis).ok_or_else(|| {
                ChartPrepError::InvalidDateValue(format!(
                    "Epoch milliseconds must be an integer, got {}",
                    n
                ))
            }),
            other => Err(ChartPrepError::InvalidDateValue(format!(
                "Expected an ISO date string or epoch milliseconds, got {}",
                other
            ))),
        }
    }
}

/// Normalize a date-like value to a calendar date.
///
/// Strings are parsed as ISO dates, RFC 3339 datetimes (converted to UTC) or
/// naive ISO datetimes; integers are epoch milliseconds in UTC. Both
/// representations of the same instant produce the same date.
///
/// # Example
/// ```
/// use chartprep::temporal::to_date;
/// let a = to_date("2020-01-01").unwrap();
/// let b = to_date(1577854800000i64).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.format("%Y%m%d").to_string(), "20200101");
/// ```
pub fn to_date(value: impl Into<DateValue>) -> Result<NaiveDate> {
    match value.into() {
        DateValue::Text(s) => parse_date_text(&s),
        DateValue::EpochMillis(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| {
                ChartPrepError::InvalidDateValue(format!(
                    "Epoch milliseconds {} out of range",
                    ms
                ))
            }),
    }
}

fn parse_date_text(text: &str) -> Result<NaiveDate> {
    let text = text.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.date());
        }
    }

    Err(ChartPrepError::InvalidDateValue(format!(
        "Cannot parse '{}' as a date",
        text
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_date_and_epoch_millis_agree() {
        let from_text = to_date("2020-01-01").unwrap();
        let from_millis = to_date(1577854800000i64).unwrap();
        assert_eq!(from_text, ymd(2020, 1, 1));
        assert_eq!(from_text, from_millis);
        assert_eq!(from_text.format("%Y%m%d").to_string(), "20200101");
    }

    #[test]
    fn test_datetime_strings() {
        assert_eq!(to_date("2020-01-01T05:00:00").unwrap(), ymd(2020, 1, 1));
        assert_eq!(to_date("2020-01-01 23:59:59.999").unwrap(), ymd(2020, 1, 1));
        assert_eq!(to_date("2020-01-01T05:00").unwrap(), ymd(2020, 1, 1));
        assert_eq!(to_date("2020-01-01T05:00:00Z").unwrap(), ymd(2020, 1, 1));
    }

    #[test]
    fn test_rfc3339_offset_converts_to_utc() {
        // 2019-12-31 22:00 at -05:00 is 2020-01-01 03:00 UTC
        assert_eq!(to_date("2019-12-31T22:00:00-05:00").unwrap(), ymd(2020, 1, 1));
    }

    #[test]
    fn test_compact_day_format() {
        assert_eq!(to_date("20200101").unwrap(), ymd(2020, 1, 1));
    }

    #[test]
    fn test_epoch_zero_and_negative() {
        assert_eq!(to_date(0i64).unwrap(), ymd(1970, 1, 1));
        assert_eq!(to_date(-86_400_000i64).unwrap(), ymd(1969, 12, 31));
    }

    #[test]
    fn test_invalid_text() {
        let err = to_date("not a date").unwrap_err();
        assert!(matches!(err, ChartPrepError::InvalidDateValue(_)));
        assert!(to_date("2020-13-01").is_err());
        assert!(to_date("").is_err());
    }

    #[test]
    fn test_out_of_range_millis() {
        assert!(matches!(
            to_date(i64::MAX),
            Err(ChartPrepError::InvalidDateValue(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let text = DateValue::try_from(&json!("2020-01-01")).unwrap();
        let millis = DateValue::try_from(&json!(1577854800000i64)).unwrap();
        assert_eq!(to_date(text).unwrap(), to_date(millis).unwrap());

        assert!(DateValue::try_from(&json!(true)).is_err());
        assert!(DateValue::try_from(&json!(null)).is_err());
        assert!(DateValue::try_from(&json!(1.5)).is_err());
        assert!(DateValue::try_from(&json!(["2020-01-01"])).is_err());
    }
}
