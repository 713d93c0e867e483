//! Transformation code
//!
//! Every aggregation returns a SQL rendering of what it did, shown to users
//! in the chart's "view code" panel. The text is derived only from the
//! resolved grouping column, column pairs and filters, so the same request
//! always renders the same code. It is never executed.

use super::kind::{AggregationKind, DROP_DUPLICATES};
use crate::naming::{self, quote_ident};

/// Resolved `(column, kind)` pair as it appears in generated code
pub(crate) type CodePair<'a> = (&'a str, AggregationKind);

fn where_clause(filters: &[String]) -> String {
    if filters.is_empty() {
        String::new()
    } else {
        let predicates: Vec<String> = filters.iter().map(|f| format!("({})", f)).collect();
        format!(" WHERE {}", predicates.join(" AND "))
    }
}

/// Code for a grouped reduction, one output column per pair
pub(crate) fn grouped_code(group_key: &str, pairs: &[CodePair<'_>], filters: &[String]) -> String {
    let key = quote_ident(group_key);
    let agg_exprs: Vec<String> = pairs
        .iter()
        .map(|(column, kind)| {
            format!(
                "{func}({col}) AS {out}",
                func = kind.sql_function(),
                col = quote_ident(column),
                out = quote_ident(&kind.output_column(column))
            )
        })
        .collect();

    let grouped = format!(
        "SELECT {key}, {aggs} FROM {table}{filter} GROUP BY {key}",
        key = key,
        aggs = agg_exprs.join(", "),
        table = naming::SOURCE_TABLE,
        filter = where_clause(filters)
    );

    if !pairs.iter().any(|(_, kind)| *kind == AggregationKind::PctSum) {
        return format!("{} ORDER BY {}", grouped, key);
    }

    // Percentages need the grand total of the grouped sums
    let final_exprs: Vec<String> = pairs
        .iter()
        .map(|(column, kind)| {
            let out = quote_ident(&kind.output_column(column));
            if *kind == AggregationKind::PctSum {
                format!(
                    "CASE WHEN SUM({out}) OVER () = 0 THEN 0.0 ELSE {out} * 100.0 / SUM({out}) OVER () END AS {out}",
                    out = out
                )
            } else {
                out
            }
        })
        .collect();

    format!(
        "WITH {cte} AS ({grouped}) SELECT {key}, {cols} FROM {cte} ORDER BY {key}",
        cte = naming::GROUPED_CTE,
        grouped = grouped,
        key = key,
        cols = final_exprs.join(", ")
    )
}

/// Code for keeping the first row per group with its original position
pub(crate) fn drop_duplicates_code(
    group_key: &str,
    value_columns: &[String],
    filters: &[String],
) -> String {
    let key = quote_ident(group_key);
    let index = quote_ident(naming::INDEX_COLUMN);
    let renamed: Vec<String> = value_columns
        .iter()
        .map(|column| {
            format!(
                "{} AS {}",
                quote_ident(column),
                quote_ident(&naming::agg_column(DROP_DUPLICATES, column))
            )
        })
        .collect();

    let mut select = vec![index.clone(), key.clone()];
    select.extend(renamed);

    format!(
        "WITH {src} AS (SELECT ROW_NUMBER() OVER () - 1 AS {index}, * FROM {table}), \
         {grouped} AS (SELECT *, ROW_NUMBER() OVER (PARTITION BY {key} ORDER BY {index}) AS {rank} FROM {src}{filter}) \
         SELECT {select} FROM {grouped} WHERE {rank} = 1 ORDER BY {index}",
        src = naming::SOURCE_CTE,
        grouped = naming::GROUPED_CTE,
        index = index,
        table = naming::SOURCE_TABLE,
        key = key,
        rank = naming::RANK_COLUMN,
        filter = where_clause(filters),
        select = select.join(", ")
    )
}

/// Code for the unaggregated pass-through
pub(crate) fn raw_code(group_key: &str, value_columns: &[String], filters: &[String]) -> String {
    let key = quote_ident(group_key);
    let mut select = vec![key.clone()];
    select.extend(value_columns.iter().map(|c| quote_ident(c)));

    format!(
        "SELECT {select} FROM {table}{filter} ORDER BY {key}",
        select = select.join(", "),
        table = naming::SOURCE_TABLE,
        filter = where_clause(filters),
        key = key
    )
}
