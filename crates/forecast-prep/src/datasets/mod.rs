//! Loaders for the M4 and M5 benchmark datasets.
//!
//! Each submodule exposes the individual steps of its build (load, reshape,
//! join) so the [`Pipeline`](crate::Pipeline) can report progress between
//! them and library callers can reuse single steps.

pub mod m4;
pub mod m5;

use crate::error::Result;
use crate::utils::require_columns;
use polars::prelude::*;
use tracing::debug;

const JOIN_ROW_INDEX: &str = "__join_row_nr";

/// Left join `right` onto `left` on the shared `keys`.
///
/// Every left row is kept in its original order; rows without a match get
/// nulls in the columns coming from `right`.
pub fn left_join(left: &DataFrame, right: &DataFrame, keys: &[&str]) -> Result<DataFrame> {
    require_columns(left, keys)?;
    require_columns(right, keys)?;

    let on: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let joined = left
        .with_row_index(JOIN_ROW_INDEX.into(), None)?
        .lazy()
        .join(
            right.clone().lazy(),
            on.clone(),
            on,
            JoinArgs {
                how: JoinType::Left,
                ..Default::default()
            },
        )
        .sort([JOIN_ROW_INDEX], SortMultipleOptions::default())
        .collect()?
        .drop(JOIN_ROW_INDEX)?;

    debug!("Left join on {:?}: {:?}", keys, joined.shape());
    Ok(joined)
}
