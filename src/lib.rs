/*!
# chartprep - Chart Data Preparation

Reshapes tabular datasets into the per-group tables chart renderers consume,
and validates chart requests before any data is touched.

## Example

```rust
use chartprep::{aggregate, AggregationKind, AggregationSpec, ColumnAggregation};
use polars::prelude::*;

let df = df! {
    "date" => ["2020-01-01", "2020-01-01", "2020-01-02"],
    "0" => [1.0, 3.0, 5.0],
}
.unwrap();

let spec = AggregationSpec::PerColumn(vec![
    ColumnAggregation::new("0", AggregationKind::Mean),
    ColumnAggregation::new("0", AggregationKind::PctSum),
]);
let result = aggregate(&df, "date", &["0"], &[], &spec).unwrap();

assert_eq!(result.columns, vec!["0|mean", "0|pctsum"]);
```

## Core Components

- [`aggregate`] - Grouped reductions, drop-duplicates and display code
- [`temporal`] - Date normalization and per-group filter predicates
- [`validate`] - Required chart parameters per chart type
- [`naming`] - Generated column and identifier naming
- [`schema`] - Column lookup and type checks
*/

pub mod aggregate;
pub mod naming;
pub mod schema;
pub mod temporal;
pub mod validate;

// Re-export key types for convenience
pub use aggregate::{
    aggregate, AggregatedData, AggregationKind, AggregationRequest, AggregationSpec,
    ColumnAggregation,
};
pub use temporal::{build_group_filter, to_date, Frequency, GroupFilter};
pub use validate::{is_valid_chart, validate_chart, ChartParams, ChartType};

// DataFrame abstraction (wraps Polars)
pub use polars::prelude::DataFrame;

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum ChartPrepError {
    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),

    #[error("Missing group column: {0}")]
    EmptyGroupKey(String),

    #[error("Invalid date value: {0}")]
    InvalidDateValue(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Data error: {0}")]
    DataError(String),
}

pub type Result<T> = std::result::Result<T, ChartPrepError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Daily readings with a true Date column, two readings on some days
    fn readings() -> DataFrame {
        df! {
            "date" => [ymd(2020, 1, 2), ymd(2020, 1, 1), ymd(2020, 1, 2), ymd(2020, 1, 1), ymd(2020, 1, 3)],
            "0" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "1" => [10i64, 20, 30, 40, 50],
        }
        .unwrap()
    }

    fn date_strings(df: &DataFrame) -> Vec<String> {
        df.column("date")
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::String)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_extended_aggregation_on_date_groups() {
        let request = AggregationRequest::from_json(
            r#"{
                "x": "date",
                "y": ["0", "1"],
                "extended_aggregation": [
                    {"col": "0", "agg": "mean"},
                    {"col": "0", "agg": "sum"},
                    {"col": "1", "agg": "mean"}
                ]
            }"#,
        )
        .unwrap();

        let (data, code, columns) = request.apply(&readings()).unwrap().into_parts();

        let names: Vec<String> = data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["date", "0|mean", "0|sum", "1|mean"]);
        assert_eq!(columns, vec!["0|mean", "0|sum", "1|mean"]);
        assert_eq!(data.column("date").unwrap().dtype(), &DataType::Date);
        assert_eq!(
            date_strings(&data),
            vec!["2020-01-01", "2020-01-02", "2020-01-03"]
        );
        assert_eq!(
            code,
            "SELECT \"date\", AVG(\"0\") AS \"0|mean\", SUM(\"0\") AS \"0|sum\", AVG(\"1\") AS \"1|mean\" \
             FROM df GROUP BY \"date\" ORDER BY \"date\""
        );
    }

    #[test]
    fn test_drop_duplicates_on_date_groups() {
        let result = aggregate(
            &readings(),
            "date",
            &["0", "1"],
            &[],
            &AggregationSpec::DropDuplicates,
        )
        .unwrap();

        let names: Vec<String> = result
            .data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["index", "date", "0|drop_duplicates", "1|drop_duplicates"]
        );
        assert_eq!(
            date_strings(&result.data),
            vec!["2020-01-02", "2020-01-01", "2020-01-03"]
        );

        // Each survivor's index points at the input row it came from
        let source = readings();
        let index = result.data.column("index").unwrap().as_materialized_series();
        let positions: Vec<usize> = index
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .map(|i| i as usize)
            .collect();
        let kept = result
            .data
            .column("0|drop_duplicates")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        let original = source.column("0").unwrap().as_materialized_series().f64().unwrap().clone();
        for (row, position) in positions.iter().enumerate() {
            assert_eq!(kept.get(row), original.get(*position));
        }
    }

    #[test]
    fn test_date_group_filter_matches_bucket() {
        // Clicking the first bar of a daily chart, sent back as epoch millis
        let from_millis = build_group_filter("date", 1577854800000i64, Frequency::Day).unwrap();
        let from_text = build_group_filter("date", "2020-01-01", Frequency::Day).unwrap();
        assert_eq!(from_millis, from_text);
        assert_eq!(from_text.predicate, "`date` == '20200101'");
        assert_eq!(from_text.label, "date: 2020-01-01");

        let quarter = build_group_filter("date", "2020-05-17", "Q".parse().unwrap()).unwrap();
        assert_eq!(quarter.predicate, "`date` == '2020Q2'");
    }

    #[test]
    fn test_validation_before_aggregation() {
        let params: ChartParams = serde_json::from_str(
            r#"{"map_type": "choropleth", "loc_mode": "geojson-id", "geojson": null}"#,
        )
        .unwrap();
        assert!(!is_valid_chart("maps", &params));
        assert!(validate_chart("maps", &params).unwrap_err().contains("geojson"));
        assert!(is_valid_chart("line", &params));
    }

    #[test]
    fn test_error_messages() {
        let err = aggregate(
            &readings(),
            "missing",
            &["0"],
            &[],
            &AggregationSpec::Global(AggregationKind::Mean),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Missing group column:"));
        assert!(err.to_string().contains("date"));

        let err = "H".parse::<Frequency>().unwrap_err();
        assert!(matches!(err, ChartPrepError::InvalidFrequency(_)));
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
