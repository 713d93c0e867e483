//! Centralized naming conventions for chartprep-generated identifiers.
//!
//! Aggregated output columns use a `<column>|<aggregation>` pattern so the
//! source column and the reducer can always be recovered from the name.
//! Names that only appear in generated transformation code (CTE aliases,
//! ranking columns) use a double-underscore prefix/suffix pattern to avoid
//! collision with user-defined names.
//!
//! # Categories
//!
//! - **Aggregated columns**: One per `(aggregation, column)` pair (`<column>|<aggregation>`)
//! - **Index column**: Original row position emitted by `drop_duplicates` (`index`)
//! - **Code identifiers**: CTE and helper names in generated SQL (`__chartprep_<name>__`)

use const_format::concatcp;

// ============================================================================
// Base Building Blocks
// ============================================================================

/// Base prefix for all chartprep SQL-level identifiers
const CHARTPREP_PREFIX: &str = "__chartprep_";

/// Suffix for all chartprep identifiers (double underscore)
const CHARTPREP_SUFFIX: &str = "__";

/// Separator between the source column and the aggregation name.
///
/// Aggregation names never contain this character, so splitting on the
/// last occurrence is unambiguous even when the column name contains it.
pub const AGG_SEPARATOR: char = '|';

// ============================================================================
// Derived Constants
// ============================================================================

/// Synthetic column holding each surviving row's original position
pub const INDEX_COLUMN: &str = "index";

/// Table name the generated code reads from
pub const SOURCE_TABLE: &str = "df";

/// CTE holding the filtered source rows: `__chartprep_source__`
pub const SOURCE_CTE: &str = concatcp!(CHARTPREP_PREFIX, "source", CHARTPREP_SUFFIX);

/// CTE holding per-group results before post-processing: `__chartprep_grouped__`
pub const GROUPED_CTE: &str = concatcp!(CHARTPREP_PREFIX, "grouped", CHARTPREP_SUFFIX);

/// Per-group row rank used to keep the first row of each group: `__chartprep_rank__`
pub const RANK_COLUMN: &str = concatcp!(CHARTPREP_PREFIX, "rank", CHARTPREP_SUFFIX);

// ============================================================================
// Constructor Functions
// ============================================================================

/// Generate the output column name for an aggregation applied to a column.
///
/// The same pair always produces the same name and distinct pairs never
/// collide.
///
/// # Example
/// ```
/// use chartprep::naming;
/// assert_eq!(naming::agg_column("mean", "price"), "price|mean");
/// assert_eq!(naming::agg_column("sum", "0"), "0|sum");
/// ```
pub fn agg_column(aggregation: &str, column: &str) -> String {
    format!("{}{}{}", column, AGG_SEPARATOR, aggregation)
}

/// Quote an identifier for use in generated SQL.
///
/// # Example
/// ```
/// use chartprep::naming;
/// assert_eq!(naming::quote_ident("date"), "\"date\"");
/// assert_eq!(naming::quote_ident("a\"b"), "\"a\"\"b\"");
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ============================================================================
// Detection Functions
// ============================================================================

/// Split an aggregated column name into `(column, aggregation)`.
///
/// # Example
/// ```
/// use chartprep::naming;
/// assert_eq!(naming::split_agg_column("price|mean"), Some(("price", "mean")));
/// assert_eq!(naming::split_agg_column("a|b|sum"), Some(("a|b", "sum")));
/// assert_eq!(naming::split_agg_column("price"), None);
/// ```
pub fn split_agg_column(name: &str) -> Option<(&str, &str)> {
    let (column, aggregation) = name.rsplit_once(AGG_SEPARATOR)?;
    if aggregation.is_empty() {
        return None;
    }
    Some((column, aggregation))
}

/// Check if a column name was produced by [`agg_column`].
///
/// # Example
/// ```
/// use chartprep::naming;
/// assert!(naming::is_agg_column("price|mean"));
/// assert!(!naming::is_agg_column("price"));
/// assert!(!naming::is_agg_column("price|"));
/// ```
pub fn is_agg_column(name: &str) -> bool {
    split_agg_column(name).is_some()
}
