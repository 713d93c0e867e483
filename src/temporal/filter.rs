//! Group filter expressions
//!
//! When a user clicks a group in a chart, the host re-queries the dataset for
//! just that group. These builders turn the clicked value into a query
//! predicate plus a label describing the bucket.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::date::{to_date, DateValue};
use crate::{ChartPrepError, Result};

/// Time bucket granularity of a date group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "W")]
    Week,
    #[serde(rename = "M")]
    Month,
    #[serde(rename = "Q")]
    Quarter,
    #[serde(rename = "Y")]
    Year,
}

impl Frequency {
    /// Canonical representation of the bucket containing `date`.
    ///
    /// Injective within a frequency: distinct buckets never share a string.
    pub fn canonical(&self, date: NaiveDate) -> String {
        match self {
            Frequency::Day => date.format("%Y%m%d").to_string(),
            Frequency::Week => date.format("%G-W%V").to_string(),
            Frequency::Month => date.format("%Y%m").to_string(),
            Frequency::Quarter => format!("{}Q{}", date.year(), quarter(date)),
            Frequency::Year => date.format("%Y").to_string(),
        }
    }

    /// Human-readable name of the bucket containing `date`.
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            Frequency::Day => date.format("%Y-%m-%d").to_string(),
            Frequency::Week => date.format("%G-W%V").to_string(),
            Frequency::Month => date.format("%Y-%m").to_string(),
            Frequency::Quarter => format!("{} Q{}", date.year(), quarter(date)),
            Frequency::Year => date.format("%Y").to_string(),
        }
    }
}

fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

impl FromStr for Frequency {
    type Err = ChartPrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "D" => Ok(Frequency::Day),
            "W" => Ok(Frequency::Week),
            "M" => Ok(Frequency::Month),
            "Q" => Ok(Frequency::Quarter),
            "Y" => Ok(Frequency::Year),
            _ => Err(ChartPrepError::InvalidFrequency(format!(
                "Unknown frequency '{}' (expected one of D, W, M, Q, Y)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Frequency::Day => "D",
            Frequency::Week => "W",
            Frequency::Month => "M",
            Frequency::Quarter => "Q",
            Frequency::Year => "Y",
        };
        write!(f, "{}", s)
    }
}

/// A predicate selecting one group, plus its display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFilter {
    /// Query predicate, e.g. `` `date` == '20200101' ``
    pub predicate: String,
    /// Label for the group, e.g. `date: 2020-01-01`
    pub label: String,
}

/// Quote a column name for a query predicate.
fn quote_column(column: &str) -> String {
    format!("`{}`", column.replace('`', "``"))
}

/// Build the filter for one date bucket.
///
/// # Example
/// ```
/// use chartprep::temporal::{build_group_filter, Frequency};
/// let from_text = build_group_filter("date", "2020-01-01", Frequency::Day).unwrap();
/// let from_millis = build_group_filter("date", 1577854800000i64, Frequency::Day).unwrap();
/// assert_eq!(from_text.predicate, "`date` == '20200101'");
/// assert_eq!(from_text, from_millis);
/// ```
pub fn build_group_filter(
    column: &str,
    value: impl Into<DateValue>,
    frequency: Frequency,
) -> Result<GroupFilter> {
    let date = to_date(value)?;
    Ok(GroupFilter {
        predicate: format!(
            "{} == '{}'",
            quote_column(column),
            frequency.canonical(date)
        ),
        label: format!("{}: {}", column, frequency.label(date)),
    })
}

/// Build the filter for a non-temporal group value.
///
/// Null selects missing values, numbers and booleans compare unquoted,
/// strings are single-quoted.
pub fn build_value_filter(column: &str, value: &serde_json::Value) -> Result<GroupFilter> {
    let quoted = quote_column(column);
    let (predicate, shown) = match value {
        serde_json::Value::Null => {
            return Ok(GroupFilter {
                predicate: format!("{} != {}", quoted, quoted),
                label: format!("{}: NaN", column),
            })
        }
        serde_json::Value::Bool(b) => {
            let literal = if *b { "True" } else { "False" };
            (format!("{} == {}", quoted, literal), literal.to_string())
        }
        serde_json::Value::Number(n) => (format!("{} == {}", quoted, n), n.to_string()),
        serde_json::Value::String(s) => (
            format!("{} == '{}'", quoted, s.replace('\\', "\\\\").replace('\'', "\\'")),
            s.clone(),
        ),
        other => {
            return Err(ChartPrepError::InvalidRequest(format!(
                "Group value for '{}' must be a scalar, got {}",
                column, other
            )))
        }
    };

    Ok(GroupFilter {
        predicate,
        label: format!("{}: {}", column, shown),
    })
}
