//! M5 Walmart sales data.
//!
//! The build melts `sales_train_validation.csv` (one row per item/store,
//! one `d_N` column per day) to long format and attaches the calendar and
//! weekly sell prices.

use super::left_join;
use crate::error::Result;
use crate::features::{DiffColumns, add_category_mean_diff, add_differences};
use crate::io::read_csv;
use crate::reshape::WideToLong;
use crate::utils::require_columns;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

pub const SALES_FILE: &str = "sales_train_validation.csv";
pub const CALENDAR_FILE: &str = "calendar.csv";
pub const PRICES_FILE: &str = "sell_prices.csv";
pub const OUTPUT_FILE: &str = "m5_long.parquet";

/// Identifier columns kept on every long row.
pub const ID_COLUMNS: [&str; 6] = ["id", "item_id", "dept_id", "cat_id", "store_id", "state_id"];
/// Keys joining the long table to the sell prices.
pub const PRICE_KEYS: [&str; 3] = ["store_id", "item_id", "wm_yr_wk"];

pub const DAY_COL: &str = "d";
pub const SALES_COL: &str = "sales";
pub const DATE_COL: &str = "date";
pub const CATEGORY_COL: &str = "cat_id";
pub const CATEGORY_MEAN_DIFF_COL: &str = "cat_mean_diff";

const DAY_PREFIX: &str = "d_";

/// The three raw M5 tables.
#[derive(Debug, Clone)]
pub struct M5Raw {
    pub sales: DataFrame,
    pub calendar: DataFrame,
    pub prices: DataFrame,
}

/// Load sales, calendar and prices from `raw_dir`.
pub fn load_raw(raw_dir: &Path) -> Result<M5Raw> {
    let sales = read_csv(&raw_dir.join(SALES_FILE))?;
    require_columns(&sales, &ID_COLUMNS)?;
    let calendar = read_csv(&raw_dir.join(CALENDAR_FILE))?;
    require_columns(&calendar, &[DAY_COL])?;
    let prices = read_csv(&raw_dir.join(PRICES_FILE))?;
    require_columns(&prices, &PRICE_KEYS)?;

    Ok(M5Raw {
        sales,
        calendar,
        prices,
    })
}

/// Melt the sales table to (ids..., `d`, `sales`).
pub fn melt_sales(sales: &DataFrame) -> Result<DataFrame> {
    WideToLong::new(ID_COLUMNS, DAY_PREFIX)
        .names(DAY_COL, SALES_COL)
        .apply(sales)
}

/// Left join the calendar on `d`, then the prices on
/// (`store_id`, `item_id`, `wm_yr_wk`).
pub fn join_calendar_and_prices(
    sales_long: &DataFrame,
    calendar: &DataFrame,
    prices: &DataFrame,
) -> Result<DataFrame> {
    let with_calendar = left_join(sales_long, calendar, &[DAY_COL])?;
    let joined = left_join(&with_calendar, prices, &PRICE_KEYS)?;
    info!("M5 long table: {:?}", joined.shape());
    Ok(joined)
}

/// Add `sales_diff` per item and `cat_mean_diff` per (category, date).
pub fn add_difference_features(df: &DataFrame) -> Result<DataFrame> {
    let cols = DiffColumns::default();
    let with_diff = add_differences(df, &cols)?;
    add_category_mean_diff(
        &with_diff,
        CATEGORY_COL,
        DATE_COL,
        &cols.output,
        CATEGORY_MEAN_DIFF_COL,
    )
}
