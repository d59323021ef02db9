//! Progress reporting for dataset builds.
//!
//! A build moves through a fixed sequence of [`PipelineStage`]s and emits a
//! [`ProgressUpdate`] at each milestone. Callers subscribe with a
//! [`ProgressReporter`] or, more conveniently, a closure.
//!
//! # Example
//!
//! ```rust,ignore
//! use forecast_prep::Pipeline;
//!
//! let summary = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run_m4()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of a dataset build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading raw CSV inputs
    Loading,
    /// Drawing the per-category series sample
    Sampling,
    /// Melting wide tables to long format
    Reshaping,
    /// Attaching metadata, calendar or price tables
    Joining,
    /// Filtering series and computing derived columns
    Features,
    /// Persisting the output as Parquet
    Writing,
    /// Build completed successfully
    Complete,
    /// Build failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Inputs",
            Self::Sampling => "Sampling Series",
            Self::Reshaping => "Reshaping to Long Format",
            Self::Joining => "Joining Metadata",
            Self::Features => "Deriving Features",
            Self::Writing => "Writing Output",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the whole build spent in this stage (0.0 - 1.0).
    ///
    /// The non-terminal stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.25,
            Self::Sampling => 0.05,
            Self::Reshaping => 0.25,
            Self::Joining => 0.20,
            Self::Features => 0.10,
            Self::Writing => 0.15,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Sampling => 0.25,
            Self::Reshaping => 0.30,
            Self::Joining => 0.55,
            Self::Features => 0.75,
            Self::Writing => 0.85,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current stage
    pub stage: PipelineStage,

    /// Dataset being built (e.g. "m4", "m5")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a progress update for a stage.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            dataset: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Tag the update with the dataset it belongs to.
    pub fn for_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Complete, 1.0, message)
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Failed, 0.0, message)
    }
}

/// Receiver of progress updates.
///
/// Implementations must be `Send + Sync` so a build can run on a worker
/// thread while reporting to the caller.
pub trait ProgressReporter: Send + Sync {
    /// Called at every stage milestone. Should return quickly.
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
