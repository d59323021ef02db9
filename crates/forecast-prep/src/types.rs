use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Run Summary
// ============================================================================

/// Summary of one finished dataset build or split.
///
/// Serialized as-is by the binary's `--json` mode.
///
/// # Example
///
/// ```rust,ignore
/// let summary = pipeline.run_m4()?;
/// println!("{} series, {} rows in {}ms", summary.series_count, summary.rows, summary.duration_ms);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Name of the build ("m4", "m5", "split").
    pub dataset: String,

    /// Files written by the run. Empty when saving is disabled.
    pub outputs: Vec<PathBuf>,

    /// Number of distinct series in the result.
    pub series_count: usize,

    /// Rows in the result (train + test for splits).
    pub rows: usize,

    /// Columns in the result.
    pub columns: usize,

    /// Wall-clock time of the run in milliseconds.
    pub duration_ms: u64,

    /// Local timestamp at which the summary was produced.
    pub generated_at: String,
}

impl RunSummary {
    /// Create a summary stamped with the current local time.
    pub fn new(dataset: impl Into<String>, series_count: usize, shape: (usize, usize)) -> Self {
        Self {
            dataset: dataset.into(),
            outputs: Vec::new(),
            series_count,
            rows: shape.0,
            columns: shape.1,
            duration_ms: 0,
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Record a written file.
    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.outputs.push(path);
        self
    }

    /// Set the run duration.
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// One-line human-readable description.
    pub fn headline(&self) -> String {
        let target = match self.outputs.as_slice() {
            [] => "memory".to_string(),
            [single] => single.display().to_string(),
            many => many
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        };
        format!(
            "{}: {} series, {} rows x {} columns -> {} ({}ms)",
            self.dataset, self.series_count, self.rows, self.columns, target, self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_summary_headline() {
        let summary = RunSummary::new("m4", 3, (30, 5))
            .with_output(PathBuf::from("data/processed/m4_daily_sampled.parquet"))
            .with_duration_ms(12);
        assert_eq!(
            summary.headline(),
            "m4: 3 series, 30 rows x 5 columns -> data/processed/m4_daily_sampled.parquet (12ms)"
        );
        assert_eq!(RunSummary::new("m5", 0, (0, 0)).headline(), "m5: 0 series, 0 rows x 0 columns -> memory (0ms)");
    }

    #[test]
    fn test_run_summary_json_roundtrip() {
        let summary = RunSummary::new("split", 2, (10, 3))
            .with_output(PathBuf::from("a_train.parquet"))
            .with_output(PathBuf::from("a_test.parquet"));

        let json = serde_json::to_string(&summary).expect("Should serialize");
        assert!(json.contains("\"dataset\":\"split\""));
        assert!(json.contains("\"generated_at\""));

        let back: RunSummary = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(back.outputs.len(), 2);
        assert_eq!(back.series_count, 2);
    }
}
