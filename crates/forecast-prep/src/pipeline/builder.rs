//! Main data-preparation pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the M4 and M5 builds and the train/test split.

use crate::config::PipelineConfig;
use crate::datasets::{m4, m5};
use crate::error::Result;
use crate::io::{read_parquet, write_parquet};
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::preprocessing::{restrict_to_series, valid_series_ids};
use crate::sampling::sample_ids_by_category;
use crate::split::{TestSize, temporal_train_test_split};
use crate::types::RunSummary;
use crate::utils::n_unique;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The data-preparation pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use forecast_prep::{Pipeline, PipelineConfig};
///
/// let summary = Pipeline::builder()
///     .config(PipelineConfig::builder().n_per_category(10).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run_m4()?;
///
/// // In-memory only
/// let m5 = Pipeline::builder().build()?.build_m5()?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Pipeline can be moved to a worker thread
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the sampled M4 Daily long table and persist it.
    ///
    /// Writes `m4_daily_sampled.parquet` to the processed directory unless
    /// saving is disabled. Nothing is written when any step fails.
    pub fn run_m4(&self) -> Result<RunSummary> {
        self.instrument("m4", |started| {
            let mut df = self.build_m4()?;
            let series = n_unique(&df, m4::ID_COL)?;
            let mut summary = RunSummary::new("m4", series, df.shape());
            if let Some(path) = self.save(&mut df, m4::OUTPUT_FILE, "m4")? {
                summary = summary.with_output(path);
            }
            Ok(summary.with_duration_ms(elapsed_ms(started)))
        })
    }

    /// Build the M5 long table and persist it.
    pub fn run_m5(&self) -> Result<RunSummary> {
        self.instrument("m5", |started| {
            let mut df = self.build_m5()?;
            let series = n_unique(&df, m5::ID_COLUMNS[0])?;
            let mut summary = RunSummary::new("m5", series, df.shape());
            if let Some(path) = self.save(&mut df, m5::OUTPUT_FILE, "m5")? {
                summary = summary.with_output(path);
            }
            Ok(summary.with_duration_ms(elapsed_ms(started)))
        })
    }

    /// Split a long Parquet table into `<stem>_train.parquet` and
    /// `<stem>_test.parquet` next to the processed outputs.
    pub fn run_split(
        &self,
        input: &Path,
        id_col: &str,
        time_col: &str,
        test_size: TestSize,
    ) -> Result<RunSummary> {
        self.instrument("split", |started| {
            test_size.validate()?;

            self.report("split", PipelineStage::Loading, 0.0, format!("Reading {}", input.display()));
            let df = read_parquet(input)?;

            self.report("split", PipelineStage::Features, 0.0, format!("Splitting with test size {}", test_size));
            let mut split = temporal_train_test_split(&df, id_col, time_col, test_size)?;

            let series = n_unique(&df, id_col)?;
            let mut summary = RunSummary::new("split", series, (split.train.height() + split.test.height(), df.width()));

            if self.config.save_to_disk {
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "table".to_string());
                self.report("split", PipelineStage::Writing, 0.0, "Writing train and test partitions");

                let train_path = self.config.processed_path(&format!("{}_train.parquet", stem));
                let test_path = self.config.processed_path(&format!("{}_test.parquet", stem));
                let train_path = write_parquet(&mut split.train, &train_path)?;
                let test_path = match write_parquet(&mut split.test, &test_path) {
                    Ok(path) => path,
                    Err(e) => {
                        // both partitions or neither
                        let _ = fs::remove_file(&train_path);
                        return Err(e);
                    }
                };
                summary = summary.with_output(train_path).with_output(test_path);
            }

            Ok(summary.with_duration_ms(elapsed_ms(started)))
        })
    }

    /// Build the sampled M4 long table in memory.
    ///
    /// Columns: `M4id`, `time_idx`, `value`, `category`, `SP`.
    pub fn build_m4(&self) -> Result<DataFrame> {
        let raw_dir = self.config.raw_data_dir.as_path();

        self.report("m4", PipelineStage::Loading, 0.0, "Loading M4 metadata");
        let info = m4::load_info(raw_dir)?;
        let info_period = m4::filter_period(&info, &self.config.sampling_period)?;

        self.report("m4", PipelineStage::Sampling, 0.0, "Sampling series per category");
        let sampled_ids = sample_ids_by_category(
            &info_period,
            m4::ID_COL,
            m4::CATEGORY_COL,
            self.config.n_per_category,
            self.config.random_state,
        )?;

        self.report("m4", PipelineStage::Loading, 0.5, "Loading M4 Daily series");
        let wide = m4::load_daily_wide(raw_dir, Some(sampled_ids.as_slice()))?;

        self.report("m4", PipelineStage::Reshaping, 0.0, "Melting Daily data to long format");
        let long = m4::melt_daily_to_long(&wide)?;

        self.report("m4", PipelineStage::Joining, 0.0, "Attaching series metadata");
        let mut df = m4::attach_metadata(&long, &info_period)?;

        if let Some(required_days) = self.config.required_days {
            self.report(
                "m4",
                PipelineStage::Features,
                0.0,
                format!("Keeping series with {} observed days", required_days),
            );
            let valid = valid_series_ids(&df, m4::ID_COL, m4::VALUE_COL, m4::TIME_COL, required_days)?;
            df = restrict_to_series(&df, m4::ID_COL, &valid)?;
        }

        info!("M4 table ready: {:?}", df.shape());
        Ok(df)
    }

    /// Build the M5 long table in memory.
    pub fn build_m5(&self) -> Result<DataFrame> {
        self.report("m5", PipelineStage::Loading, 0.0, "Loading M5 sales, calendar and prices");
        let raw = m5::load_raw(&self.config.raw_data_dir)?;

        self.report("m5", PipelineStage::Reshaping, 0.0, "Melting sales to long format");
        let sales_long = m5::melt_sales(&raw.sales)?;

        self.report("m5", PipelineStage::Joining, 0.0, "Joining calendar and prices");
        let mut df = m5::join_calendar_and_prices(&sales_long, &raw.calendar, &raw.prices)?;

        if self.config.add_difference_features {
            self.report("m5", PipelineStage::Features, 0.0, "Adding difference features");
            df = m5::add_difference_features(&df)?;
        }

        info!("M5 table ready: {:?}", df.shape());
        Ok(df)
    }

    /// Run `body`, reporting completion or failure to the progress reporter.
    fn instrument<F>(&self, dataset: &str, body: F) -> Result<RunSummary>
    where
        F: FnOnce(Instant) -> Result<RunSummary>,
    {
        let started = Instant::now();
        info!("Starting {} pipeline...", dataset);

        match body(started) {
            Ok(summary) => {
                self.report_progress(
                    ProgressUpdate::complete(format!("{} pipeline completed", dataset)).for_dataset(dataset),
                );
                Ok(summary)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()).for_dataset(dataset));
                error!("{} pipeline failed [{}]: {}", dataset, e.error_code(), e);
                Err(e)
            }
        }
    }

    fn save(&self, df: &mut DataFrame, file_name: &str, dataset: &str) -> Result<Option<PathBuf>> {
        if !self.config.save_to_disk {
            debug!("Saving disabled; keeping {} in memory", dataset);
            return Ok(None);
        }
        let path = self.config.processed_path(file_name);
        self.report(dataset, PipelineStage::Writing, 0.0, format!("Writing {}", path.display()));
        write_parquet(df, &path).map(Some)
    }

    fn report(&self, dataset: &str, stage: PipelineStage, stage_progress: f32, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::new(stage, stage_progress, message).for_dataset(dataset));
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use forecast_prep::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StageLogger;
    ///
    /// impl ProgressReporter for StageLogger {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(StageLogger))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Convenience over [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
