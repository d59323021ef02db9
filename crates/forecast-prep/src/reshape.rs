//! Wide-to-long reshaping.
//!
//! Benchmark files store one series per row and one time step per column
//! (`V2, V3, ...` for M4, `d_1, d_2, ...` for M5). [`WideToLong`] turns such a
//! table into one row per (id, time key, value).

use crate::error::{PrepError, Result};
use crate::utils::column;
use polars::prelude::*;
use tracing::{debug, info};

/// How the time key of a long row is derived from its source column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKey {
    /// Strip the prefix, parse the rest as an integer and subtract `offset`.
    Decoded { offset: i64 },
    /// Keep the source column name verbatim.
    Label,
}

/// Wide-to-long reshaping specification.
///
/// # Example
///
/// ```rust,ignore
/// use forecast_prep::reshape::{TimeKey, WideToLong};
///
/// // M4: V2 -> 0, V3 -> 1, ...
/// let long = WideToLong::new(["M4id"], "V")
///     .time_key(TimeKey::Decoded { offset: 2 })
///     .names("time_idx", "value")
///     .apply(&wide)?;
/// ```
#[derive(Debug, Clone)]
pub struct WideToLong {
    id_columns: Vec<String>,
    prefix: String,
    time_key: TimeKey,
    time_name: String,
    value_name: String,
}

impl WideToLong {
    /// Create a reshaper keeping `id_columns` and melting every other column
    /// whose name starts with `prefix`.
    pub fn new<I, S>(id_columns: I, prefix: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id_columns: id_columns.into_iter().map(Into::into).collect(),
            prefix: prefix.into(),
            time_key: TimeKey::Label,
            time_name: "variable".to_string(),
            value_name: "value".to_string(),
        }
    }

    /// Set how the time key is derived.
    pub fn time_key(mut self, time_key: TimeKey) -> Self {
        self.time_key = time_key;
        self
    }

    /// Set the names of the produced time and value columns.
    pub fn names(mut self, time_name: impl Into<String>, value_name: impl Into<String>) -> Self {
        self.time_name = time_name.into();
        self.value_name = value_name.into();
        self
    }

    /// Names of the value columns that would be melted, in table order.
    pub fn value_columns(&self, df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| name.starts_with(&self.prefix) && !self.id_columns.contains(name))
            .collect()
    }

    /// Reshape `df` to long format.
    ///
    /// Rows are emitted column-major: every input row for the first value
    /// column, then every input row for the next one. The output has
    /// `df.height() * value_columns` rows and values are cast to Float64.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let value_cols = self.value_columns(df);
        if value_cols.is_empty() {
            return Err(PrepError::InvalidInput(format!(
                "no columns with prefix '{}' to reshape",
                self.prefix
            )));
        }

        info!(
            "Melting {} rows x {} value columns to long format",
            df.height(),
            value_cols.len()
        );

        let n_rows = df.height();
        let n_long = n_rows * value_cols.len();

        let time_column = self.time_column(&value_cols, n_rows)?;

        let mut columns: Vec<Column> = Vec::with_capacity(self.id_columns.len() + 2);
        for id in &self.id_columns {
            let original = column(df, id)?.as_materialized_series().clone();
            let mut repeated = original.clone();
            for _ in 1..value_cols.len() {
                repeated.append(&original)?;
            }
            columns.push(repeated.into_column());
        }

        columns.push(time_column);

        let mut values = Series::new_empty(self.value_name.as_str().into(), &DataType::Float64);
        for name in &value_cols {
            let casted = column(df, name)?
                .cast(&DataType::Float64)?
                .as_materialized_series()
                .clone();
            values.append(&casted)?;
        }
        columns.push(values.into_column());

        let long = DataFrame::new(columns)?;
        debug_assert_eq!(long.height(), n_long);
        debug!("Long data shape: {:?}", long.shape());
        Ok(long)
    }

    fn time_column(&self, value_cols: &[String], n_rows: usize) -> Result<Column> {
        let name: PlSmallStr = self.time_name.as_str().into();
        match self.time_key {
            TimeKey::Decoded { offset } => {
                let mut indices: Vec<i64> = Vec::with_capacity(value_cols.len() * n_rows);
                for col_name in value_cols {
                    let index = col_name[self.prefix.len()..].parse::<i64>().map_err(|_| {
                        PrepError::InvalidColumnName {
                            column: col_name.clone(),
                            prefix: self.prefix.clone(),
                        }
                    })?;
                    indices.extend(std::iter::repeat_n(index - offset, n_rows));
                }
                Ok(Column::new(name, indices))
            }
            TimeKey::Label => {
                let labels: Vec<&str> = value_cols
                    .iter()
                    .flat_map(|col_name| std::iter::repeat_n(col_name.as_str(), n_rows))
                    .collect();
                Ok(Column::new(name, labels))
            }
        }
    }
}

/// Total count of non-missing cells across the given columns.
pub fn non_null_cells(df: &DataFrame, columns: &[String]) -> Result<usize> {
    columns.iter().try_fold(0usize, |acc, name| {
        let col = column(df, name)?;
        Ok(acc + (col.len() - col.null_count()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn m4_wide() -> DataFrame {
        df! {
            "M4id" => ["D1", "D2"],
            "V2" => [Some(10.0), Some(20.0)],
            "V3" => [Some(11.0), None],
            "V4" => [None::<f64>, None],
        }
        .unwrap()
    }

    #[test]
    fn test_m4_time_index_decoding() {
        let long = WideToLong::new(["M4id"], "V")
            .time_key(TimeKey::Decoded { offset: 2 })
            .names("time_idx", "value")
            .apply(&m4_wide())
            .unwrap();

        assert_eq!(long.shape(), (6, 3));
        let times: Vec<Option<i64>> = long.column("time_idx").unwrap().as_materialized_series().i64().unwrap().into_iter().collect();
        assert_eq!(times, vec![Some(0), Some(0), Some(1), Some(1), Some(2), Some(2)]);
        let ids: Vec<Option<&str>> = long.column("M4id").unwrap().as_materialized_series().str().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some("D1"), Some("D2"), Some("D1"), Some("D2"), Some("D1"), Some("D2")]);
    }

    #[test]
    fn test_non_null_count_preserved() {
        let wide = m4_wide();
        let reshaper = WideToLong::new(["M4id"], "V").time_key(TimeKey::Decoded { offset: 2 });
        let value_cols = reshaper.value_columns(&wide);
        let long = reshaper.apply(&wide).unwrap();

        let wide_cells = non_null_cells(&wide, &value_cols).unwrap();
        let long_values = long.column("value").unwrap();
        assert_eq!(wide_cells, 3);
        assert_eq!(long_values.len() - long_values.null_count(), wide_cells);
    }

    #[test]
    fn test_label_time_key_keeps_column_names() {
        let wide = df! {
            "id" => ["A", "B"],
            "store_id" => ["S1", "S1"],
            "d_1" => [1i64, 0],
            "d_2" => [3i64, 2],
        }
        .unwrap();

        let long = WideToLong::new(["id", "store_id"], "d_")
            .names("d", "sales")
            .apply(&wide)
            .unwrap();

        assert_eq!(long.get_column_names_str(), vec!["id", "store_id", "d", "sales"]);
        let days: Vec<Option<&str>> = long.column("d").unwrap().as_materialized_series().str().unwrap().into_iter().collect();
        assert_eq!(days, vec![Some("d_1"), Some("d_1"), Some("d_2"), Some("d_2")]);
        assert_eq!(long.column("sales").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_unparseable_suffix_rejected() {
        let wide = df! {
            "M4id" => ["D1"],
            "V2" => [1.0],
            "Vx" => [2.0],
        }
        .unwrap();

        let err = WideToLong::new(["M4id"], "V")
            .time_key(TimeKey::Decoded { offset: 2 })
            .apply(&wide)
            .unwrap_err();
        assert!(matches!(err, PrepError::InvalidColumnName { ref column, .. } if column == "Vx"));
    }

    #[test]
    fn test_no_value_columns() {
        let wide = df! { "M4id" => ["D1"] }.unwrap();
        let err = WideToLong::new(["M4id"], "V").apply(&wide).unwrap_err();
        assert!(matches!(err, PrepError::InvalidInput(_)));
    }
}
