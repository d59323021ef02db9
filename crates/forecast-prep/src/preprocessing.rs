//! Row- and series-level filters applied before modeling.

use crate::error::Result;
use crate::utils::{f64_values, require_columns, row_mask, string_values};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Default number of leading time steps a series must fully cover.
pub const DEFAULT_REQUIRED_DAYS: usize = 731;

/// Drop rows whose `value_col` is null or NaN.
pub fn drop_missing_values(df: &DataFrame, value_col: &str) -> Result<DataFrame> {
    let keep: Vec<bool> = f64_values(df, value_col)?
        .into_iter()
        .map(|value| value.is_some_and(|v| !v.is_nan()))
        .collect();
    let filtered = df.filter(&row_mask(&keep))?;
    debug!(
        "Dropped {} rows with missing '{}'",
        df.height() - filtered.height(),
        value_col
    );
    Ok(filtered)
}

/// Ids of the series with at least `required_days` non-null values among
/// their rows with `time_col < required_days`.
///
/// The table is only inspected; the returned ids are sorted.
pub fn valid_series_ids(
    df: &DataFrame,
    id_col: &str,
    value_col: &str,
    time_col: &str,
    required_days: usize,
) -> Result<Vec<String>> {
    require_columns(df, &[id_col, value_col, time_col])?;

    let required = required_days as i64;
    let sufficient = df
        .clone()
        .lazy()
        .filter(col(time_col).lt(lit(required)))
        .group_by([col(id_col)])
        .agg([col(value_col).count().alias("n_observed")])
        .filter(col("n_observed").gt_eq(lit(required)))
        .sort([id_col], SortMultipleOptions::default())
        .collect()?;

    let ids: Vec<String> = string_values(&sufficient, id_col)?
        .into_iter()
        .flatten()
        .collect();

    info!(
        "{} series have at least {} observations in their first {} steps",
        ids.len(),
        required_days,
        required_days
    );
    Ok(ids)
}

/// Keep only the rows whose `id_col` value is one of `ids`.
pub fn restrict_to_series<S: AsRef<str>>(
    df: &DataFrame,
    id_col: &str,
    ids: &[S],
) -> Result<DataFrame> {
    let wanted: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
    let keep: Vec<bool> = string_values(df, id_col)?
        .iter()
        .map(|id| id.as_deref().is_some_and(|id| wanted.contains(id)))
        .collect();
    Ok(df.filter(&row_mask(&keep))?)
}
