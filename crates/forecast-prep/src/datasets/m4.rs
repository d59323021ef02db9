//! M4 Daily competition data.
//!
//! `M4-info.csv` holds one metadata row per series (`M4id`, `category`,
//! `SP`, ...). `Daily-train.csv` holds one series per row: the id in `V1`
//! followed by observations in `V2, V3, ...`, padded with empty cells.

use super::left_join;
use crate::error::{PrepError, Result};
use crate::io::read_csv;
use crate::preprocessing::restrict_to_series;
use crate::reshape::{TimeKey, WideToLong};
use crate::utils::{require_columns, row_mask, string_values};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

pub const INFO_FILE: &str = "M4-info.csv";
pub const DAILY_TRAIN_FILE: &str = "Daily-train.csv";
pub const OUTPUT_FILE: &str = "m4_daily_sampled.parquet";

pub const ID_COL: &str = "M4id";
pub const CATEGORY_COL: &str = "category";
pub const PERIOD_COL: &str = "SP";
pub const TIME_COL: &str = "time_idx";
pub const VALUE_COL: &str = "value";

/// Column holding the id in the raw wide file.
const RAW_ID_COL: &str = "V1";
/// Prefix of the observation columns.
const VALUE_PREFIX: &str = "V";
/// `V2` is the first observation, so it maps to time index 0.
const TIME_OFFSET: i64 = 2;

/// Load `M4-info.csv` from `raw_dir`.
pub fn load_info(raw_dir: &Path) -> Result<DataFrame> {
    let info = read_csv(&raw_dir.join(INFO_FILE))?;
    require_columns(&info, &[ID_COL, CATEGORY_COL, PERIOD_COL])?;
    Ok(info)
}

/// Keep the metadata rows whose `SP` equals `period`.
pub fn filter_period(info: &DataFrame, period: &str) -> Result<DataFrame> {
    let keep: Vec<bool> = string_values(info, PERIOD_COL)?
        .iter()
        .map(|sp| sp.as_deref() == Some(period))
        .collect();
    let filtered = info.filter(&row_mask(&keep))?;
    info!("{} metadata rows with SP == '{}'", filtered.height(), period);
    Ok(filtered)
}

/// Load `Daily-train.csv` in wide format with `V1` renamed to `M4id`.
///
/// When `sampled_ids` is given, only those series are kept.
pub fn load_daily_wide(raw_dir: &Path, sampled_ids: Option<&[String]>) -> Result<DataFrame> {
    let mut df = read_csv(&raw_dir.join(DAILY_TRAIN_FILE))?;
    if df.column(RAW_ID_COL).is_ok() {
        df.rename(RAW_ID_COL, ID_COL.into())?;
    } else if df.column(ID_COL).is_err() {
        return Err(PrepError::ColumnNotFound(RAW_ID_COL.to_string()));
    }

    match sampled_ids {
        Some(ids) => {
            let filtered = restrict_to_series(&df, ID_COL, ids)?;
            info!("Filtered to {} sampled series", filtered.height());
            Ok(filtered)
        }
        None => Ok(df),
    }
}

/// Melt the wide Daily table to (`M4id`, `time_idx`, `value`).
pub fn melt_daily_to_long(daily: &DataFrame) -> Result<DataFrame> {
    WideToLong::new([ID_COL], VALUE_PREFIX)
        .time_key(TimeKey::Decoded {
            offset: TIME_OFFSET,
        })
        .names(TIME_COL, VALUE_COL)
        .apply(daily)
}

/// Left join (`category`, `SP`) from the metadata onto the long table.
pub fn attach_metadata(long: &DataFrame, info: &DataFrame) -> Result<DataFrame> {
    let meta = info.select([ID_COL, CATEGORY_COL, PERIOD_COL])?;
    let joined = left_join(long, &meta, &[ID_COL])?;
    debug!("M4 long table with metadata: {:?}", joined.shape());
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info() -> DataFrame {
        df! {
            "M4id" => ["D1", "D2", "M1"],
            "category" => ["Finance", "Macro", "Finance"],
            "Frequency" => [1i64, 1, 12],
            "SP" => ["Daily", "Daily", "Monthly"],
        }
        .unwrap()
    }

    #[test]
    fn test_filter_period() {
        let daily = filter_period(&info(), "Daily").unwrap();
        assert_eq!(daily.height(), 2);
        assert_eq!(filter_period(&info(), "Hourly").unwrap().height(), 0);
    }

    #[test]
    fn test_melt_and_attach_metadata() {
        let wide = df! {
            "M4id" => ["D1", "D2"],
            "V2" => [Some(1.0), Some(5.0)],
            "V3" => [Some(2.0), None],
        }
        .unwrap();

        let long = melt_daily_to_long(&wide).unwrap();
        assert_eq!(long.get_column_names_str(), vec!["M4id", "time_idx", "value"]);

        let daily_info = filter_period(&info(), "Daily").unwrap();
        let joined = attach_metadata(&long, &daily_info).unwrap();
        assert_eq!(
            joined.get_column_names_str(),
            vec!["M4id", "time_idx", "value", "category", "SP"]
        );
        let categories: Vec<Option<String>> = string_values(&joined, "category").unwrap();
        assert_eq!(
            categories,
            vec![
                Some("Finance".to_string()),
                Some("Macro".to_string()),
                Some("Finance".to_string()),
                Some("Macro".to_string()),
            ]
        );
    }
}
