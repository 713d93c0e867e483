//! Reducer vocabulary
//!
//! `drop_duplicates` is deliberately absent: it keeps whole rows rather than
//! reducing a column, and is modelled as [`super::AggregationSpec::DropDuplicates`].

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{naming, schema, ChartPrepError, Result};

/// Name of the row-keeping pseudo aggregation
pub const DROP_DUPLICATES: &str = "drop_duplicates";

/// A per-group reducer applied to one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    Mean,
    Sum,
    First,
    /// Group sum as a percentage of the column's grand total
    PctSum,
    Min,
    Max,
    Median,
    Count,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 8] = [
        AggregationKind::Mean,
        AggregationKind::Sum,
        AggregationKind::First,
        AggregationKind::PctSum,
        AggregationKind::Min,
        AggregationKind::Max,
        AggregationKind::Median,
        AggregationKind::Count,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregationKind::Mean => "mean",
            AggregationKind::Sum => "sum",
            AggregationKind::First => "first",
            AggregationKind::PctSum => "pctsum",
            AggregationKind::Min => "min",
            AggregationKind::Max => "max",
            AggregationKind::Median => "median",
            AggregationKind::Count => "count",
        }
    }

    /// Whether this reducer only makes sense on numeric columns
    pub fn requires_numeric(&self) -> bool {
        matches!(
            self,
            AggregationKind::Mean
                | AggregationKind::Sum
                | AggregationKind::PctSum
                | AggregationKind::Median
        )
    }

    /// Output column name for this reducer applied to `column`
    pub fn output_column(&self, column: &str) -> String {
        naming::agg_column(self.name(), column)
    }

    /// Reject columns whose dtype this reducer cannot handle
    pub fn check_dtype(&self, column: &str, dtype: &DataType) -> Result<()> {
        if self.requires_numeric() && !schema::is_numeric(dtype) {
            return Err(ChartPrepError::InvalidAggregation(format!(
                "Aggregation '{}' requires a numeric column but '{}' is {}",
                self, column, dtype
            )));
        }
        Ok(())
    }

    /// Per-group reduction expression.
    ///
    /// `pctsum` reduces to the group sum here; the share of the grand total
    /// is computed after grouping by [`pct_of_total`].
    pub fn reduce(&self, column: &str) -> Expr {
        let c = col(column);
        match self {
            AggregationKind::Mean => c.mean(),
            AggregationKind::Sum | AggregationKind::PctSum => c.sum(),
            AggregationKind::First => c.first(),
            AggregationKind::Min => c.min(),
            AggregationKind::Max => c.max(),
            AggregationKind::Median => c.median(),
            AggregationKind::Count => c.count(),
        }
    }

    /// SQL spelling of the reduction, for generated code
    pub fn sql_function(&self) -> &'static str {
        match self {
            AggregationKind::Mean => "AVG",
            AggregationKind::Sum | AggregationKind::PctSum => "SUM",
            AggregationKind::First => "FIRST",
            AggregationKind::Min => "MIN",
            AggregationKind::Max => "MAX",
            AggregationKind::Median => "MEDIAN",
            AggregationKind::Count => "COUNT",
        }
    }
}

/// Rewrite an already-summed column as a percentage of its total.
///
/// A zero total yields `0.0` for every group rather than NaN or infinity.
pub fn pct_of_total(column: &str) -> Expr {
    let value = col(column).cast(DataType::Float64);
    let total = col(column).cast(DataType::Float64).sum();
    when(total.clone().eq(lit(0.0)))
        .then(lit(0.0))
        .otherwise(value * lit(100.0) / total)
        .alias(column)
}

impl FromStr for AggregationKind {
    type Err = ChartPrepError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(kind) = AggregationKind::ALL.iter().find(|k| k.name() == s) {
            return Ok(*kind);
        }
        let hint = if s == DROP_DUPLICATES {
            " (drop_duplicates keeps whole rows and cannot be applied per column)"
        } else {
            ""
        };
        Err(ChartPrepError::InvalidAggregation(format!(
            "Unknown aggregation '{}'{}",
            s, hint
        )))
    }
}

impl std::fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_kinds() {
        for kind in AggregationKind::ALL {
            assert_eq!(kind.name().parse::<AggregationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_unknown() {
        let err = "mode".parse::<AggregationKind>().unwrap_err();
        assert!(matches!(err, ChartPrepError::InvalidAggregation(_)));

        let err = DROP_DUPLICATES.parse::<AggregationKind>().unwrap_err();
        assert!(err.to_string().contains("per column"));
    }

    #[test]
    fn test_serde_names_match_display() {
        for kind in AggregationKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.to_string()));
        }
    }

    #[test]
    fn test_output_column() {
        assert_eq!(AggregationKind::Mean.output_column("0"), "0|mean");
        assert_eq!(AggregationKind::PctSum.output_column("0"), "0|pctsum");
    }

    #[test]
    fn test_output_columns_are_distinct_per_kind() {
        let names: std::collections::HashSet<String> = AggregationKind::ALL
            .iter()
            .map(|k| k.output_column("x"))
            .collect();
        assert_eq!(names.len(), AggregationKind::ALL.len());
    }

    #[test]
    fn test_check_dtype() {
        assert!(AggregationKind::Mean.check_dtype("a", &DataType::Int64).is_ok());
        assert!(AggregationKind::Mean.check_dtype("a", &DataType::String).is_err());
        assert!(AggregationKind::PctSum.check_dtype("a", &DataType::Boolean).is_err());
        assert!(AggregationKind::First.check_dtype("a", &DataType::String).is_ok());
        assert!(AggregationKind::Count.check_dtype("a", &DataType::String).is_ok());
        assert!(AggregationKind::Max.check_dtype("a", &DataType::String).is_ok());
    }
}
