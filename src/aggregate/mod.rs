//! Aggregation engine
//!
//! Reshapes a raw dataset into the per-group table a chart renderer consumes.
//! A request names a grouping column (usually the x axis), the value columns,
//! optional row filters and an [`AggregationSpec`]. The result carries the
//! aggregated DataFrame, a SQL rendering of the operation for display, and the
//! generated column names in output order.
//!
//! # Example
//!
//! ```rust
//! use chartprep::aggregate::{aggregate, AggregationKind, AggregationSpec};
//! use polars::prelude::*;
//!
//! let df = df! {
//!     "date" => ["2020-01-02", "2020-01-01", "2020-01-02"],
//!     "sales" => [1.0, 2.0, 3.0],
//! }
//! .unwrap();
//!
//! let result = aggregate(
//!     &df,
//!     "date",
//!     &["sales"],
//!     &[],
//!     &AggregationSpec::Global(AggregationKind::Mean),
//! )
//! .unwrap();
//!
//! assert_eq!(result.columns, vec!["sales|mean"]);
//! assert_eq!(result.data.height(), 2);
//! ```

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::{naming, schema, ChartPrepError, Result};

pub(crate) mod code;
pub mod kind;

pub use kind::{pct_of_total, AggregationKind, DROP_DUPLICATES};

// ============================================================================
// Specification Types
// ============================================================================

/// One reducer applied to one source column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnAggregation {
    #[serde(rename = "col")]
    pub column: String,
    #[serde(rename = "agg")]
    pub kind: AggregationKind,
}

impl ColumnAggregation {
    pub fn new(column: impl Into<String>, kind: AggregationKind) -> Self {
        Self {
            column: column.into(),
            kind,
        }
    }

    /// Name of the column this pair produces
    pub fn output_column(&self) -> String {
        self.kind.output_column(&self.column)
    }
}

/// How value columns are combined within each group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationSpec {
    /// No aggregation: value columns pass through under their own names,
    /// rows sorted by the group key
    Raw,
    /// One reducer applied to every value column
    Global(AggregationKind),
    /// Keep the first row of each group, tagged with its original position
    DropDuplicates,
    /// Explicit `(column, reducer)` pairs; value columns are ignored
    PerColumn(Vec<ColumnAggregation>),
}

/// Loosely typed per-column entry as sent by the host (`{"col": .., "agg": ..}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedAggregation {
    pub col: String,
    pub agg: String,
}

impl AggregationSpec {
    /// Resolve the host's `agg` / `extended_aggregation` parameters.
    ///
    /// A non-empty extended list takes precedence over `agg`.
    pub fn parse(agg: Option<&str>, extended: Option<&[RequestedAggregation]>) -> Result<Self> {
        if let Some(entries) = extended.filter(|e| !e.is_empty()) {
            let pairs = entries
                .iter()
                .map(|e| Ok(ColumnAggregation::new(e.col.clone(), e.agg.parse()?)))
                .collect::<Result<Vec<_>>>()?;
            return Ok(AggregationSpec::PerColumn(pairs));
        }

        match agg {
            None | Some("raw") => Ok(AggregationSpec::Raw),
            Some(DROP_DUPLICATES) => Ok(AggregationSpec::DropDuplicates),
            Some(name) => Ok(AggregationSpec::Global(name.parse()?)),
        }
    }
}

// ============================================================================
// Request Configuration
// ============================================================================

/// Aggregation parameters of a chart request.
///
/// ```rust
/// use chartprep::aggregate::{AggregationRequest, AggregationSpec};
///
/// let request = AggregationRequest::from_json(
///     r#"{"x": "date", "y": ["0", "1"], "agg": "drop_duplicates"}"#,
/// )
/// .unwrap();
/// assert_eq!(request.spec().unwrap(), AggregationSpec::DropDuplicates);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationRequest {
    /// Grouping column
    pub x: String,
    /// Value columns
    pub y: Vec<String>,
    /// Single aggregation name, absent for no aggregation
    pub agg: Option<String>,
    /// Per-column aggregations, overriding `agg` and `y`
    pub extended_aggregation: Option<Vec<RequestedAggregation>>,
    /// SQL row predicates applied before aggregating
    #[serde(alias = "query")]
    pub filters: Vec<String>,
}

impl AggregationRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ChartPrepError::InvalidRequest(format!("Failed to parse aggregation request: {}", e))
        })
    }

    pub fn spec(&self) -> Result<AggregationSpec> {
        AggregationSpec::parse(self.agg.as_deref(), self.extended_aggregation.as_deref())
    }

    /// Run this request against a dataset
    pub fn apply(&self, df: &DataFrame) -> Result<AggregatedData> {
        aggregate(df, &self.x, &self.y, &self.filters, &self.spec()?)
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Output of [`aggregate`]
#[derive(Debug, Clone)]
pub struct AggregatedData {
    /// Aggregated dataset, group key first (after `index` for drop_duplicates)
    pub data: DataFrame,
    /// SQL rendering of the operation, for display
    pub code: String,
    /// Generated value column names, in output order
    pub columns: Vec<String>,
}

impl AggregatedData {
    pub fn into_parts(self) -> (DataFrame, String, Vec<String>) {
        (self.data, self.code, self.columns)
    }
}

/// Aggregate `df` by `group_key` according to `spec`.
///
/// The input is never modified. `filters` are SQL predicates (e.g.
/// `"price" > 10`) AND-ed together and applied before grouping.
///
/// # Errors
///
/// - `EmptyGroupKey` if `group_key` is not a column of `df`
/// - `InvalidAggregation` if a value column is missing, a reducer does not
///   fit a column's dtype, or nothing was requested
/// - `InvalidFilter` if a filter does not parse
pub fn aggregate<S: AsRef<str>>(
    df: &DataFrame,
    group_key: &str,
    value_columns: &[S],
    filters: &[String],
    spec: &AggregationSpec,
) -> Result<AggregatedData> {
    schema::require_group_key(df, group_key)?;
    let predicate = compile_filters(filters)?;
    let value_columns = unique_columns(value_columns.iter().map(|c| c.as_ref()));

    debug!(
        "Aggregating {} rows by '{}' with {:?} over {:?}",
        df.height(),
        group_key,
        spec,
        value_columns
    );

    let result = match spec {
        AggregationSpec::Raw => raw(df, group_key, &value_columns, predicate, filters),
        AggregationSpec::DropDuplicates => {
            drop_duplicates(df, group_key, &value_columns, predicate, filters)
        }
        AggregationSpec::Global(kind) => {
            let pairs: Vec<ColumnAggregation> = value_columns
                .iter()
                .map(|c| ColumnAggregation::new(c.clone(), *kind))
                .collect();
            reduce(df, group_key, &pairs, predicate, filters)
        }
        AggregationSpec::PerColumn(pairs) => reduce(df, group_key, pairs, predicate, filters),
    }?;

    debug!(
        "Aggregated to {} rows, columns {:?}",
        result.data.height(),
        result.columns
    );

    Ok(result)
}

/// Parse and AND together the row filters
fn compile_filters(filters: &[String]) -> Result<Option<Expr>> {
    let mut combined: Option<Expr> = None;
    for filter in filters {
        let expr = polars::sql::sql_expr(filter).map_err(|e| {
            ChartPrepError::InvalidFilter(format!("Failed to parse filter `{}`: {}", filter, e))
        })?;
        combined = Some(match combined {
            Some(acc) => acc.and(expr),
            None => expr,
        });
    }
    Ok(combined)
}

/// Drop repeated names, keeping first occurrences in order
fn unique_columns<'a>(columns: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    columns
        .filter(|c| seen.insert(*c))
        .map(|c| c.to_string())
        .collect()
}

fn require_columns(df: &DataFrame, value_columns: &[String]) -> Result<()> {
    if value_columns.is_empty() {
        return Err(ChartPrepError::InvalidAggregation(
            "No value columns requested".to_string(),
        ));
    }
    for column in value_columns {
        schema::require_value_column(df, column)?;
    }
    Ok(())
}

fn filtered(lf: LazyFrame, predicate: Option<Expr>) -> LazyFrame {
    match predicate {
        Some(expr) => lf.filter(expr),
        None => lf,
    }
}

fn collect(lf: LazyFrame) -> Result<DataFrame> {
    lf.collect().map_err(|e| {
        ChartPrepError::DataError(format!("Failed to compute aggregation: {}", e))
    })
}

/// Grouped reduction, one output column per distinct pair
fn reduce(
    df: &DataFrame,
    group_key: &str,
    pairs: &[ColumnAggregation],
    predicate: Option<Expr>,
    filters: &[String],
) -> Result<AggregatedData> {
    if pairs.is_empty() {
        return Err(ChartPrepError::InvalidAggregation(
            "No aggregations requested".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let pairs: Vec<&ColumnAggregation> = pairs.iter().filter(|p| seen.insert(*p)).collect();

    for pair in &pairs {
        let dtype = schema::require_value_column(df, &pair.column)?;
        pair.kind.check_dtype(&pair.column, &dtype)?;
    }

    let columns: Vec<String> = pairs.iter().map(|p| p.output_column()).collect();

    let aggs: Vec<Expr> = pairs
        .iter()
        .zip(&columns)
        .map(|(pair, out)| pair.kind.reduce(&pair.column).alias(out.as_str()))
        .collect();

    let percentages: Vec<Expr> = pairs
        .iter()
        .zip(&columns)
        .filter(|(pair, _)| pair.kind == AggregationKind::PctSum)
        .map(|(_, out)| pct_of_total(out))
        .collect();

    let mut select = vec![col(group_key)];
    select.extend(columns.iter().map(|c| col(c.as_str())));

    let mut lf = filtered(df.clone().lazy(), predicate)
        .group_by([col(group_key)])
        .agg(aggs);
    if !percentages.is_empty() {
        lf = lf.with_columns(percentages);
    }
    let data = collect(
        lf.select(select)
            .sort([group_key], SortMultipleOptions::default()),
    )?;

    let code_pairs: Vec<code::CodePair<'_>> =
        pairs.iter().map(|p| (p.column.as_str(), p.kind)).collect();

    Ok(AggregatedData {
        data,
        code: code::grouped_code(group_key, &code_pairs, filters),
        columns,
    })
}

/// First row per group in original order, with its original row position
fn drop_duplicates(
    df: &DataFrame,
    group_key: &str,
    value_columns: &[String],
    predicate: Option<Expr>,
    filters: &[String],
) -> Result<AggregatedData> {
    require_columns(df, value_columns)?;
    if schema::column_dtype(df, naming::INDEX_COLUMN).is_some() {
        return Err(ChartPrepError::InvalidAggregation(format!(
            "Column '{}' is reserved for row positions in {}",
            naming::INDEX_COLUMN,
            DROP_DUPLICATES
        )));
    }

    let columns: Vec<String> = value_columns
        .iter()
        .map(|c| naming::agg_column(DROP_DUPLICATES, c))
        .collect();

    let mut aggs = vec![col(naming::INDEX_COLUMN).first()];
    aggs.extend(
        value_columns
            .iter()
            .zip(&columns)
            .map(|(c, out)| col(c.as_str()).first().alias(out.as_str())),
    );

    let mut select = vec![col(naming::INDEX_COLUMN), col(group_key)];
    select.extend(columns.iter().map(|c| col(c.as_str())));

    // Row positions are attached before filtering so they refer to the input
    let lf = df.clone().lazy().with_row_index(naming::INDEX_COLUMN, None);
    let data = collect(
        filtered(lf, predicate)
            .group_by_stable([col(group_key)])
            .agg(aggs)
            .select(select),
    )?;

    Ok(AggregatedData {
        data,
        code: code::drop_duplicates_code(group_key, value_columns, filters),
        columns,
    })
}

/// Unaggregated pass-through under bare column names
fn raw(
    df: &DataFrame,
    group_key: &str,
    value_columns: &[String],
    predicate: Option<Expr>,
    filters: &[String],
) -> Result<AggregatedData> {
    require_columns(df, value_columns)?;

    let columns: Vec<String> = value_columns
        .iter()
        .filter(|c| c.as_str() != group_key)
        .cloned()
        .collect();

    let mut select = vec![col(group_key)];
    select.extend(columns.iter().map(|c| col(c.as_str())));

    let data = collect(
        filtered(df.clone().lazy(), predicate)
            .select(select)
            .sort(
                [group_key],
                SortMultipleOptions::default().with_maintain_order(true),
            ),
    )?;

    Ok(AggregatedData {
        data,
        code: code::raw_code(group_key, &columns, filters),
        columns,
    })
}
