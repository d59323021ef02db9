//! Rate-of-change features for long sales tables.

use crate::error::{PrepError, Result};
use crate::utils::{column, is_numeric_dtype, require_columns};
use polars::prelude::*;
use tracing::{debug, info};

/// Temporary column carrying the input row position through re-sorts.
const ROW_INDEX: &str = "__row_nr";

/// Column names used by [`add_differences`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffColumns {
    pub group: String,
    pub date: String,
    pub value: String,
    pub output: String,
}

impl Default for DiffColumns {
    fn default() -> Self {
        Self {
            group: "id".to_string(),
            date: "date".to_string(),
            value: "sales".to_string(),
            output: "sales_diff".to_string(),
        }
    }
}

/// Add the first difference of `value` within each `group`.
///
/// Each row gets `value - previous value of the same group`, where "previous"
/// means the next earlier row by date (ties broken by input position). The
/// first row of every group is null. Rows come back sorted by date, again
/// with ties in input order.
pub fn add_differences(df: &DataFrame, cols: &DiffColumns) -> Result<DataFrame> {
    require_columns(df, &[&cols.group, &cols.date, &cols.value])?;
    let dtype = column(df, &cols.value)?.dtype();
    if !is_numeric_dtype(dtype) {
        return Err(PrepError::InvalidInput(format!(
            "cannot difference column '{}' with dtype {}",
            cols.value, dtype
        )));
    }

    info!("Adding '{}' grouped by '{}'", cols.output, cols.group);

    let value = || col(cols.value.as_str()).cast(DataType::Float64);
    let stable = SortMultipleOptions::default().with_maintain_order(true);

    let indexed = df.with_row_index(ROW_INDEX.into(), None)?;
    let with_diff = indexed
        .lazy()
        .sort([cols.group.as_str(), cols.date.as_str(), ROW_INDEX], stable.clone())
        .with_column(
            (value() - value().shift(lit(1)))
                .over([col(cols.group.as_str())])
                .alias(cols.output.as_str()),
        )
        .sort([cols.date.as_str(), ROW_INDEX], stable)
        .collect()?;

    let out = with_diff.drop(ROW_INDEX)?;
    debug!(
        "'{}' has {} null entries",
        cols.output,
        column(&out, &cols.output)?.null_count()
    );
    Ok(out)
}

/// Add the mean of `diff_col` over every (`category_col`, `date_col`) pair.
///
/// The mean ignores nulls and is broadcast to each row of its pair; a pair
/// with only null differences gets null.
pub fn add_category_mean_diff(
    df: &DataFrame,
    category_col: &str,
    date_col: &str,
    diff_col: &str,
    out_col: &str,
) -> Result<DataFrame> {
    require_columns(df, &[category_col, date_col, diff_col])?;
    info!("Adding '{}' over ({}, {})", out_col, category_col, date_col);

    let out = df
        .clone()
        .lazy()
        .with_column(
            col(diff_col)
                .cast(DataType::Float64)
                .mean()
                .over([col(category_col), col(date_col)])
                .alias(out_col),
        )
        .collect()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{f64_values, string_values};
    use pretty_assertions::assert_eq;

    fn sales() -> DataFrame {
        df! {
            "id" => ["A", "B", "A", "B", "A"],
            "cat_id" => ["FOODS", "FOODS", "FOODS", "FOODS", "FOODS"],
            "date" => ["2011-01-03", "2011-01-01", "2011-01-01", "2011-01-02", "2011-01-02"],
            "sales" => [5i64, 1, 2, 4, 3],
        }
        .unwrap()
    }

    #[test]
    fn test_differences_sorted_by_date() {
        let out = add_differences(&sales(), &DiffColumns::default()).unwrap();

        let ids: Vec<String> = string_values(&out, "id").unwrap().into_iter().flatten().collect();
        assert_eq!(ids, vec!["B", "A", "B", "A", "A"]);
        assert_eq!(
            f64_values(&out, "sales_diff").unwrap(),
            vec![None, None, Some(3.0), Some(1.0), Some(2.0)]
        );
        assert!(!out.get_column_names_str().contains(&ROW_INDEX));
    }

    #[test]
    fn test_single_row_groups_are_null() {
        let df = df! {
            "id" => ["A", "B"],
            "date" => ["2011-01-01", "2011-01-01"],
            "sales" => [1.0, 2.0],
        }
        .unwrap();
        let out = add_differences(&df, &DiffColumns::default()).unwrap();
        assert_eq!(out.column("sales_diff").unwrap().null_count(), 2);
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        let df = df! {
            "id" => ["A"],
            "date" => ["2011-01-01"],
            "sales" => ["many"],
        }
        .unwrap();
        let err = add_differences(&df, &DiffColumns::default()).unwrap_err();
        assert!(matches!(err, PrepError::InvalidInput(_)));
    }

    #[test]
    fn test_category_mean_diff() {
        let with_diff = add_differences(&sales(), &DiffColumns::default()).unwrap();
        let out = add_category_mean_diff(&with_diff, "cat_id", "date", "sales_diff", "cat_mean_diff").unwrap();

        assert_eq!(
            f64_values(&out, "cat_mean_diff").unwrap(),
            vec![None, None, Some(2.0), Some(2.0), Some(2.0)]
        );
        assert_eq!(out.height(), with_diff.height());
    }

    #[test]
    fn test_category_mean_separates_categories() {
        let df = df! {
            "cat_id" => ["FOODS", "HOBBIES", "FOODS", "HOBBIES"],
            "date" => ["d", "d", "d", "d"],
            "sales_diff" => [Some(1.0), Some(10.0), Some(3.0), None],
        }
        .unwrap();
        let out = add_category_mean_diff(&df, "cat_id", "date", "sales_diff", "cat_mean_diff").unwrap();
        assert_eq!(
            f64_values(&out, "cat_mean_diff").unwrap(),
            vec![Some(2.0), Some(10.0), Some(2.0), Some(10.0)]
        );
    }
}
