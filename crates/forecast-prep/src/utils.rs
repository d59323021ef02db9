//! Shared utilities for the data-preparation pipeline.
//!
//! Column lookups that fail with [`PrepError::ColumnNotFound`] instead of a
//! bare polars error, plus typed extraction of columns into Rust vectors.

use crate::error::{PrepError, Result};
use polars::prelude::*;

// =============================================================================
// Column Lookup
// =============================================================================

/// Get a column by name, mapping a miss to [`PrepError::ColumnNotFound`].
pub fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| PrepError::ColumnNotFound(name.to_string()))
}

/// Ensure every named column exists in the DataFrame.
pub fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    for name in names {
        column(df, name)?;
    }
    Ok(())
}

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
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

// =============================================================================
// Typed Extraction
// =============================================================================

/// Read a column as optional strings, casting non-string dtypes.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let casted = column(df, name)?.cast(&DataType::String)?;
    let chunked = casted.as_materialized_series().str()?;
    Ok(chunked
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Read a numeric column as optional `f64` values.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = column(df, name)?;
    if !is_numeric_dtype(col.dtype()) && !matches!(col.dtype(), DataType::Null) {
        return Err(PrepError::InvalidInput(format!(
            "column '{}' has non-numeric dtype {}",
            name,
            col.dtype()
        )));
    }
    let casted = col.cast(&DataType::Float64)?;
    let chunked = casted.as_materialized_series().f64()?;
    Ok(chunked.into_iter().collect())
}

/// Number of distinct values in a column (null counts as one value).
pub fn n_unique(df: &DataFrame, name: &str) -> Result<usize> {
    Ok(column(df, name)?.n_unique()?)
}

/// Build a boolean row mask suitable for [`DataFrame::filter`].
pub fn row_mask(values: &[bool]) -> BooleanChunked {
    BooleanChunked::from_slice("mask".into(), values)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df! {
            "id" => ["a", "b", "c"],
            "num" => [Some(1i64), None, Some(3)],
        }
        .unwrap()
    }

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_missing_column() {
        let df = sample_df();
        let err = column(&df, "nope").unwrap_err();
        assert!(matches!(err, PrepError::ColumnNotFound(ref c) if c == "nope"));
        assert!(require_columns(&df, &["id", "num"]).is_ok());
        assert!(require_columns(&df, &["id", "value"]).is_err());
    }

    #[test]
    fn test_string_values_casts_numbers() {
        let df = sample_df();
        let values = string_values(&df, "num").unwrap();
        assert_eq!(
            values,
            vec![Some("1".to_string()), None, Some("3".to_string())]
        );
    }

    #[test]
    fn test_f64_values() {
        let df = sample_df();
        assert_eq!(f64_values(&df, "num").unwrap(), vec![Some(1.0), None, Some(3.0)]);
        assert!(f64_values(&df, "id").is_err());
    }

    #[test]
    fn test_row_mask_filters() {
        let df = sample_df();
        let filtered = df.filter(&row_mask(&[true, false, true])).unwrap();
        assert_eq!(filtered.height(), 2);
        assert_eq!(n_unique(&filtered, "id").unwrap(), 2);
    }
}
