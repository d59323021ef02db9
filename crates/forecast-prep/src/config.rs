//! Configuration types for the data-preparation pipeline.
//!
//! Options are set through [`PipelineConfig::builder()`]; the defaults
//! reproduce the reference runs (100 series per category, seed 42, the
//! `data/raw` → `data/processed` layout).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default directory holding the raw benchmark CSV files.
pub const DEFAULT_RAW_DATA_DIR: &str = "data/raw";

/// Default directory receiving processed Parquet files.
pub const DEFAULT_PROCESSED_DATA_DIR: &str = "data/processed";

/// Default number of series drawn per M4 category.
pub const DEFAULT_N_PER_CATEGORY: usize = 100;

/// Default random seed for stratified sampling.
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Default M4 sampling period.
pub const DEFAULT_SAMPLING_PERIOD: &str = "Daily";

/// Configuration for the data-preparation pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use forecast_prep::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .raw_data_dir("fixtures/raw")
///     .n_per_category(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the raw CSV inputs.
    /// Default: "data/raw"
    pub raw_data_dir: PathBuf,

    /// Directory receiving processed Parquet outputs. Created if missing.
    /// Default: "data/processed"
    pub processed_data_dir: PathBuf,

    /// Maximum number of M4 series sampled per category.
    /// Default: 100
    pub n_per_category: usize,

    /// Seed for the stratified sampler.
    /// Default: 42
    pub random_state: u64,

    /// M4 sampling period (`SP` column) to keep.
    /// Default: "Daily"
    pub sampling_period: String,

    /// When set, only M4 series with at least this many non-missing values
    /// among their first `required_days` time steps are kept.
    /// Default: None
    pub required_days: Option<usize>,

    /// Whether to add `sales_diff` / `cat_mean_diff` to the M5 table.
    /// Default: false
    pub add_difference_features: bool,

    /// Whether to persist the resulting tables as Parquet.
    /// When false, results are kept in memory only.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_dir: PathBuf::from(DEFAULT_RAW_DATA_DIR),
            processed_data_dir: PathBuf::from(DEFAULT_PROCESSED_DATA_DIR),
            n_per_category: DEFAULT_N_PER_CATEGORY,
            random_state: DEFAULT_RANDOM_STATE,
            sampling_period: DEFAULT_SAMPLING_PERIOD.to_string(),
            required_days: None,
            add_difference_features: false,
            save_to_disk: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.n_per_category == 0 {
            return Err(ConfigValidationError::InvalidSampleSize(self.n_per_category));
        }

        if self.sampling_period.trim().is_empty() {
            return Err(ConfigValidationError::EmptySamplingPeriod);
        }

        if self.required_days == Some(0) {
            return Err(ConfigValidationError::InvalidRequiredDays(0));
        }

        Ok(())
    }

    /// Path of a raw input file.
    pub fn raw_path(&self, file_name: &str) -> PathBuf {
        self.raw_data_dir.join(file_name)
    }

    /// Path of a processed output file.
    pub fn processed_path(&self, file_name: &str) -> PathBuf {
        self.processed_data_dir.join(file_name)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid per-category sample size: {0} (must be at least 1)")]
    InvalidSampleSize(usize),

    #[error("Sampling period must not be empty")]
    EmptySamplingPeriod,

    #[error("Invalid required days: {0} (must be at least 1)")]
    InvalidRequiredDays(usize),
}

impl From<ConfigValidationError> for crate::error::PrepError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::PrepError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    raw_data_dir: Option<PathBuf>,
    processed_data_dir: Option<PathBuf>,
    n_per_category: Option<usize>,
    random_state: Option<u64>,
    sampling_period: Option<String>,
    required_days: Option<usize>,
    add_difference_features: Option<bool>,
    save_to_disk: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the directory holding the raw CSV inputs.
    pub fn raw_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_data_dir = Some(path.into());
        self
    }

    /// Set the directory receiving processed outputs.
    pub fn processed_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.processed_data_dir = Some(path.into());
        self
    }

    /// Set the maximum number of series sampled per category.
    pub fn n_per_category(mut self, n: usize) -> Self {
        self.n_per_category = Some(n);
        self
    }

    /// Set the sampling seed.
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Set the M4 sampling period to keep (e.g. "Daily").
    pub fn sampling_period(mut self, period: impl Into<String>) -> Self {
        self.sampling_period = Some(period.into());
        self
    }

    /// Keep only series with enough observations in their first `days` steps.
    pub fn required_days(mut self, days: usize) -> Self {
        self.required_days = Some(days);
        self
    }

    /// Enable or disable M5 difference features.
    pub fn add_difference_features(mut self, enable: bool) -> Self {
        self.add_difference_features = Some(enable);
        self
    }

    /// Enable or disable writing Parquet outputs.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            raw_data_dir: self
                .raw_data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RAW_DATA_DIR)),
            processed_data_dir: self
                .processed_data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROCESSED_DATA_DIR)),
            n_per_category: self.n_per_category.unwrap_or(DEFAULT_N_PER_CATEGORY),
            random_state: self.random_state.unwrap_or(DEFAULT_RANDOM_STATE),
            sampling_period: self
                .sampling_period
                .unwrap_or_else(|| DEFAULT_SAMPLING_PERIOD.to_string()),
            required_days: self.required_days,
            add_difference_features: self.add_difference_features.unwrap_or(false),
            save_to_disk: self.save_to_disk.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.raw_data_dir, PathBuf::from("data/raw"));
        assert_eq!(config.processed_data_dir, PathBuf::from("data/processed"));
        assert_eq!(config.n_per_category, 100);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.sampling_period, "Daily");
        assert!(config.required_days.is_none());
        assert!(config.save_to_disk);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .raw_data_dir("raw")
            .n_per_category(5)
            .random_state(7)
            .required_days(30)
            .add_difference_features(true)
            .save_to_disk(false)
            .build()
            .unwrap();

        assert_eq!(config.raw_path("M4-info.csv"), PathBuf::from("raw/M4-info.csv"));
        assert_eq!(config.n_per_category, 5);
        assert_eq!(config.random_state, 7);
        assert_eq!(config.required_days, Some(30));
        assert!(config.add_difference_features);
        assert!(!config.save_to_disk);
    }

    #[test]
    fn test_validation_zero_sample_size() {
        let result = PipelineConfig::builder().n_per_category(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSampleSize(0)
        ));
    }

    #[test]
    fn test_validation_empty_period() {
        let result = PipelineConfig::builder().sampling_period("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptySamplingPeriod
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "raw_data_dir": "in",
            "processed_data_dir": "out",
            "n_per_category": 3,
            "random_state": 1,
            "sampling_period": "Daily",
            "required_days": 10,
            "add_difference_features": true,
            "save_to_disk": false
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.processed_path("x.parquet"), PathBuf::from("out/x.parquet"));
        assert_eq!(config.required_days, Some(10));
        assert!(config.validate().is_ok());
    }
}
