//! Forecast Data Preparation Library
//!
//! Turns the M4 Daily and M5 retail benchmark datasets into long-format
//! Parquet tables ready for forecasting experiments, built with Rust and Polars.
//!
//! # Overview
//!
//! - **Reshaping**: wide (one column per time step) to long (one row per observation)
//! - **Sampling**: reproducible stratified sampling of series per category
//! - **Filtering**: keep series with enough observed history
//! - **Splitting**: per-series temporal train/test split by proportion or count
//! - **Features**: per-series differences and per-category mean differences
//! - **Metrics**: WAPE with a NaN sentinel for degenerate denominators
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use forecast_prep::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .raw_data_dir("data/raw")
//!     .n_per_category(100)
//!     .random_state(42)
//!     .build()?;
//!
//! let pipeline = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//!
//! let m4 = pipeline.run_m4()?;
//! let m5 = pipeline.run_m5()?;
//! println!("{}\n{}", m4.headline(), m5.headline());
//! ```
//!
//! # Splitting and Scoring
//!
//! ```rust,ignore
//! use forecast_prep::{TestSize, WapeOptions, temporal_train_test_split, wape};
//!
//! // 0.2 keeps the last 20% of every series; 28usize the last 28 rows
//! let split = temporal_train_test_split(&df, "M4id", "time_idx", TestSize::from(0.2))?;
//! let score = wape(&actual, &forecast, &WapeOptions::default())?;
//! ```

pub mod config;
pub mod datasets;
pub mod error;
pub mod features;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod preprocessing;
pub mod reshape;
pub mod sampling;
pub mod split;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{PrepError, Result as PrepResult, ResultExt};
pub use features::{DiffColumns, add_category_mean_diff, add_differences};
pub use metrics::{SeriesScore, WapeOptions, wape, wape_by_series};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use preprocessing::{drop_missing_values, restrict_to_series, valid_series_ids};
pub use reshape::{TimeKey, WideToLong};
pub use sampling::sample_ids_by_category;
pub use split::{TestSize, TrainTestSplit, temporal_train_test_split};
pub use types::RunSummary;
