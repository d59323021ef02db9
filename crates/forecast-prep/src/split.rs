//! Per-series temporal train/test splitting.
//!
//! Every series is cut once: its earliest rows go to train and its latest
//! `n_test` rows go to test. How `n_test` is derived depends on the
//! [`TestSize`] variant:
//!
//! - [`TestSize::Proportion`]: `floor(n * p)` for each series of length `n`
//! - [`TestSize::Count`]: the same absolute count for every series
//!
//! The variant is fixed by the value's type, so `0.5` and `1` never mean the
//! same thing:
//!
//! ```rust,ignore
//! use forecast_prep::split::{TestSize, temporal_train_test_split};
//!
//! let halves = temporal_train_test_split(&df, "M4id", "time_idx", 0.5.into())?;
//! let last_one = temporal_train_test_split(&df, "M4id", "time_idx", 1usize.into())?;
//! ```

use crate::error::{PrepError, Result};
use crate::utils::{require_columns, row_mask, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Size of the test partition of every series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestSize {
    /// Fraction of each series reserved for test; must lie in (0, 1).
    Proportion(f64),
    /// Number of trailing observations reserved per series; must be ≥ 1.
    Count(usize),
}

impl TestSize {
    /// Check the value range for the variant.
    pub fn validate(&self) -> Result<()> {
        let valid = match *self {
            TestSize::Proportion(p) => p > 0.0 && p < 1.0,
            TestSize::Count(k) => k >= 1,
        };
        if valid {
            Ok(())
        } else {
            Err(PrepError::InvalidTestSize(self.to_string()))
        }
    }

    /// Number of test rows for a series of `n` rows.
    pub fn test_rows(&self, n: usize) -> usize {
        match *self {
            TestSize::Proportion(p) => (n as f64 * p).floor() as usize,
            TestSize::Count(k) => k,
        }
    }
}

impl From<f64> for TestSize {
    fn from(p: f64) -> Self {
        TestSize::Proportion(p)
    }
}

impl From<usize> for TestSize {
    fn from(k: usize) -> Self {
        TestSize::Count(k)
    }
}

impl fmt::Display for TestSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestSize::Proportion(p) => write!(f, "{:?}", p),
            TestSize::Count(k) => write!(f, "{}", k),
        }
    }
}

/// Parses `"0.2"`/`"1e-1"` as a proportion and `"28"` as a count.
///
/// The textual form decides the variant: a literal with a decimal point or
/// exponent is a proportion even when it is `"1.0"` (which then fails
/// validation), a bare integer is a count.
impl FromStr for TestSize {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || PrepError::InvalidTestSize(trimmed.to_string());

        let size = if trimmed.contains(['.', 'e', 'E']) {
            TestSize::Proportion(trimmed.parse::<f64>().map_err(|_| invalid())?)
        } else {
            TestSize::Count(trimmed.parse::<usize>().map_err(|_| invalid())?)
        };
        size.validate()?;
        Ok(size)
    }
}

/// Train and test partitions produced by [`temporal_train_test_split`].
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: DataFrame,
    pub test: DataFrame,
}

/// Split every series of `df` into an earlier train part and a later test part.
///
/// The table is sorted by (`id_col`, `time_col`) ascending, then each series
/// of `n` rows sends its first `n - n_test` rows to train and the rest to
/// test. Both outputs keep the sorted order.
///
/// # Errors
///
/// - [`PrepError::InvalidTestSize`] when `test_size` is out of range; raised
///   before the table is touched.
/// - [`PrepError::TestSizeTooLarge`] when any series is shorter than its
///   `n_test`; no partial split is returned.
pub fn temporal_train_test_split(
    df: &DataFrame,
    id_col: &str,
    time_col: &str,
    test_size: TestSize,
) -> Result<TrainTestSplit> {
    test_size.validate()?;
    require_columns(df, &[id_col, time_col])?;

    let sorted = df.sort(
        [id_col, time_col],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;
    let ids = string_values(&sorted, id_col)?;

    let mut is_test = vec![false; sorted.height()];
    let mut n_series = 0usize;
    let mut start = 0usize;
    while start < ids.len() {
        let mut end = start + 1;
        while end < ids.len() && ids[end] == ids[start] {
            end += 1;
        }

        let n = end - start;
        let n_test = test_size.test_rows(n);
        let series_id = ids[start].as_deref().unwrap_or("<null>");
        if n_test > n {
            return Err(PrepError::TestSizeTooLarge {
                series_id: series_id.to_string(),
                requested: n_test,
                available: n,
            });
        }
        if n_test == n {
            warn!(
                "Series '{}' has {} rows and all of them go to test; its train partition is empty",
                series_id, n
            );
        }

        let split_point = start + (n - n_test);
        is_test[split_point..end].fill(true);
        n_series += 1;
        start = end;
    }

    let test_mask = row_mask(&is_test);
    let train_mask = !&test_mask;
    let train = sorted.filter(&train_mask)?;
    let test = sorted.filter(&test_mask)?;

    debug!("Split mode: {:?}", test_size);
    info!(
        "Split {} series into {} train and {} test rows",
        n_series,
        train.height(),
        test.height()
    );

    Ok(TrainTestSplit { train, test })
}
