//! Column lookup and type checks against a DataFrame schema.
//!
//! The aggregation engine does not enforce types beyond what each reducer
//! needs, so this module only answers two questions: does a column exist,
//! and is it numeric.

use crate::{ChartPrepError, DataFrame, Result};
use polars::prelude::DataType;

/// Simple type info tuple: (name, dtype)
pub type TypeInfo = (String, DataType);

/// Collect `(name, dtype)` for every column, in column order.
pub fn type_info(df: &DataFrame) -> Vec<TypeInfo> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.dtype().clone()))
        .collect()
}

/// Look up a column's dtype, if the column exists.
pub fn column_dtype(df: &DataFrame, column: &str) -> Option<DataType> {
    df.column(column).ok().map(|c| c.dtype().clone())
}

/// Whether a dtype supports arithmetic reductions (mean, sum, median).
pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Require the grouping column to be present.
pub fn require_group_key(df: &DataFrame, group_key: &str) -> Result<DataType> {
    column_dtype(df, group_key).ok_or_else(|| {
        ChartPrepError::EmptyGroupKey(format!(
            "Group column '{}' not found in dataset (available: {})",
            group_key,
            available_columns(df)
        ))
    })
}

/// Require a value column to be present.
pub fn require_value_column(df: &DataFrame, column: &str) -> Result<DataType> {
    column_dtype(df, column).ok_or_else(|| {
        ChartPrepError::InvalidAggregation(format!(
            "Column '{}' not found in dataset (available: {})",
            column,
            available_columns(df)
        ))
    })
}

fn available_columns(df: &DataFrame) -> String {
    type_info(df)
        .into_iter()
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join(", ")
}
