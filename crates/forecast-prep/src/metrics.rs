//! Forecast evaluation metrics.

use crate::error::{PrepError, Result};
use crate::utils::{f64_values, require_columns, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Options for [`wape`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WapeOptions {
    /// Denominators below this are treated as zero and yield NaN.
    pub eps: f64,
    /// Exclude positions where the true value is exactly zero.
    pub mask_zeros: bool,
}

impl Default for WapeOptions {
    fn default() -> Self {
        Self {
            eps: 1e-8,
            mask_zeros: true,
        }
    }
}

/// Weighted Absolute Percentage Error: `Σ|true - pred| / Σ|true|`.
///
/// Returns `f64::NAN` when the denominator is below `opts.eps`, which includes
/// the case where every true value is zero and zeros are masked.
///
/// # Errors
///
/// [`PrepError::LengthMismatch`] if the slices differ in length.
pub fn wape(y_true: &[f64], y_pred: &[f64], opts: &WapeOptions) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(PrepError::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }

    let (numerator, denominator) = y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, _)| !(opts.mask_zeros && **t == 0.0))
        .fold((0.0f64, 0.0f64), |(num, den), (t, p)| {
            (num + (t - p).abs(), den + t.abs())
        });

    if denominator < opts.eps {
        return Ok(f64::NAN);
    }
    Ok(numerator / denominator)
}

/// WAPE of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesScore {
    pub series_id: String,
    pub wape: f64,
}

/// Compute [`wape`] separately for every series of a long table.
///
/// Rows where either value is null are skipped. A series whose denominator
/// vanishes scores NaN rather than failing the batch. Scores are sorted by id.
pub fn wape_by_series(
    df: &DataFrame,
    id_col: &str,
    true_col: &str,
    pred_col: &str,
    opts: &WapeOptions,
) -> Result<Vec<SeriesScore>> {
    require_columns(df, &[id_col, true_col, pred_col])?;

    let ids = string_values(df, id_col)?;
    let actual = f64_values(df, true_col)?;
    let predicted = f64_values(df, pred_col)?;

    let mut pairs: BTreeMap<String, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for ((id, t), p) in ids.into_iter().zip(actual).zip(predicted) {
        let (Some(id), Some(t), Some(p)) = (id, t, p) else {
            continue;
        };
        let entry = pairs.entry(id).or_default();
        entry.0.push(t);
        entry.1.push(p);
    }

    let scores = pairs
        .into_iter()
        .map(|(series_id, (t, p))| {
            Ok(SeriesScore {
                series_id,
                wape: wape(&t, &p, opts)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Scored {} series ({} undefined)",
        scores.len(),
        scores.iter().filter(|s| s.wape.is_nan()).count()
    );
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_all_zero_truth_is_nan() {
        let w = wape(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0], &WapeOptions::default()).unwrap();
        assert!(w.is_nan());
    }

    #[test]
    fn test_perfect_and_zero_forecasts() {
        let opts = WapeOptions::default();
        assert_eq!(wape(&[1.0, 2.0], &[1.0, 2.0], &opts).unwrap(), 0.0);
        assert_eq!(wape(&[1.0, 2.0], &[0.0, 0.0], &opts).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_masking() {
        let masked = wape(&[0.0, 4.0], &[2.0, 3.0], &WapeOptions::default()).unwrap();
        assert!((masked - 0.25).abs() < 1e-12);

        let unmasked = WapeOptions {
            mask_zeros: false,
            ..Default::default()
        };
        let w = wape(&[0.0, 4.0], &[2.0, 3.0], &unmasked).unwrap();
        assert!((w - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_negative_values_use_absolute_denominator() {
        let w = wape(&[-2.0, 2.0], &[-1.0, 1.0], &WapeOptions::default()).unwrap();
        assert!((w - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let err = wape(&[1.0, 2.0], &[1.0], &WapeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            PrepError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_empty_input_is_nan() {
        assert!(wape(&[], &[], &WapeOptions::default()).unwrap().is_nan());
    }

    #[test]
    fn test_wape_by_series() {
        let df = df! {
            "id" => ["b", "a", "a", "b", "c"],
            "actual" => [Some(0.0), Some(2.0), Some(2.0), Some(0.0), None],
            "forecast" => [Some(1.0), Some(2.0), Some(1.0), Some(5.0), Some(1.0)],
        }
        .unwrap();

        let scores = wape_by_series(&df, "id", "actual", "forecast", &WapeOptions::default()).unwrap();
        let ids: Vec<&str> = scores.iter().map(|s| s.series_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!((scores[0].wape - 0.25).abs() < 1e-12);
        assert!(scores[1].wape.is_nan());
    }
}
