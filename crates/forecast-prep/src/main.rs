//! CLI entry point for the forecast data-preparation pipeline.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use forecast_prep::config::{
    DEFAULT_N_PER_CATEGORY, DEFAULT_PROCESSED_DATA_DIR, DEFAULT_RANDOM_STATE, DEFAULT_RAW_DATA_DIR,
    DEFAULT_SAMPLING_PERIOD,
};
use forecast_prep::{Pipeline, PipelineConfig, PrepError, RunSummary, TestSize};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Prepare the M4 Daily and M5 benchmark datasets for forecasting",
    long_about = "Builds long-format Parquet tables from the raw M4 and M5 CSV files.\n\n\
                  EXAMPLES:\n  \
                  # Build both datasets with defaults\n  \
                  forecast-prep\n\n  \
                  # Sample 20 M4 series per category with a custom seed\n  \
                  forecast-prep m4 --n-per-category 20 --seed 7\n\n  \
                  # M5 with difference features\n  \
                  forecast-prep m5 --with-differences\n\n  \
                  # Keep the last 28 observations of every series for testing\n  \
                  forecast-prep split --input data/processed/m4_daily_sampled.parquet --test-size 28"
)]
struct Cli {
    /// Directory holding the raw CSV files
    #[arg(long, global = true, default_value = DEFAULT_RAW_DATA_DIR)]
    raw_dir: PathBuf,

    /// Directory receiving the Parquet outputs (created if missing)
    #[arg(long, global = true, default_value = DEFAULT_PROCESSED_DATA_DIR)]
    processed_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Only show warnings, errors and the final result
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print run summaries as JSON instead of human-readable lines
    ///
    /// Disables all logs so stdout only carries JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the sampled M4 Daily long table
    M4(M4Args),
    /// Build the M5 long table with calendar and prices
    M5(M5Args),
    /// Build M4 then M5 with default options
    All,
    /// Split a long Parquet table into train and test partitions
    Split(SplitArgs),
}

#[derive(ClapArgs, Debug)]
struct M4Args {
    /// Maximum number of series sampled per category
    #[arg(long, default_value_t = DEFAULT_N_PER_CATEGORY)]
    n_per_category: usize,

    /// Seed for the stratified sampler
    #[arg(long, default_value_t = DEFAULT_RANDOM_STATE)]
    seed: u64,

    /// M4 sampling period (`SP` column) to keep
    #[arg(long, default_value = DEFAULT_SAMPLING_PERIOD)]
    period: String,

    /// Keep only series fully observed over their first N steps
    #[arg(long)]
    required_days: Option<usize>,
}

#[derive(ClapArgs, Debug)]
struct M5Args {
    /// Add `sales_diff` and `cat_mean_diff` columns
    #[arg(long)]
    with_differences: bool,
}

#[derive(ClapArgs, Debug)]
struct SplitArgs {
    /// Long-format Parquet table to split
    #[arg(short, long)]
    input: PathBuf,

    /// Series identifier column
    #[arg(long, default_value = "M4id")]
    id_col: String,

    /// Time ordering column
    #[arg(long, default_value = "time_idx")]
    time_col: String,

    /// Test size: a proportion such as 0.2, or a row count such as 28
    #[arg(long)]
    test_size: TestSize,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.quiet, cli.json);

    let default_command = Command::All;
    let command = cli.command.as_ref().unwrap_or(&default_command);
    let config = build_config(&cli, command)?;
    let pipeline = build_pipeline(&cli, config)?;

    let outcome = match command {
        Command::M4(_) => pipeline.run_m4().map(|s| vec![s]),
        Command::M5(_) => pipeline.run_m5().map(|s| vec![s]),
        Command::All => run_all(&pipeline),
        Command::Split(args) => pipeline
            .run_split(&args.input, &args.id_col, &args.time_col, args.test_size)
            .map(|s| vec![s]),
    };

    match outcome {
        Ok(summaries) => print_summaries(&summaries, cli.json),
        Err(e) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            Err(e).context("Pipeline failed")
        }
    }
}

fn build_config(cli: &Cli, command: &Command) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .raw_data_dir(&cli.raw_dir)
        .processed_data_dir(&cli.processed_dir);

    match command {
        Command::M4(args) => {
            builder = builder
                .n_per_category(args.n_per_category)
                .random_state(args.seed)
                .sampling_period(&args.period);
            if let Some(days) = args.required_days {
                builder = builder.required_days(days);
            }
        }
        Command::M5(args) => {
            builder = builder.add_difference_features(args.with_differences);
        }
        Command::All | Command::Split(_) => {}
    }

    Ok(builder.build()?)
}

fn build_pipeline(cli: &Cli, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !cli.quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// M4 then M5; stops at the first failure.
fn run_all(pipeline: &Pipeline) -> std::result::Result<Vec<RunSummary>, PrepError> {
    let m4 = pipeline.run_m4()?;
    let m5 = pipeline.run_m5().inspect_err(|_| {
        error!("M5 build failed after M4 completed; M4 output was kept");
    })?;
    Ok(vec![m4, m5])
}

/// Print the final result.
///
/// `println!` is intentional: this is the command's output, not a log line.
fn print_summaries(summaries: &[RunSummary], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }

    for summary in summaries {
        println!("{}", summary.headline());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_all() {
        let cli = Cli::try_parse_from(["forecast-prep"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.raw_dir, PathBuf::from("data/raw"));
    }

    #[test]
    fn test_cli_split_test_size_forms() {
        let cli = Cli::try_parse_from([
            "forecast-prep",
            "split",
            "--input",
            "m4.parquet",
            "--test-size",
            "0.25",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Split(args)) => assert_eq!(args.test_size, TestSize::Proportion(0.25)),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["forecast-prep", "split", "-i", "m4.parquet", "--test-size", "28"]).unwrap();
        match cli.command {
            Some(Command::Split(args)) => assert_eq!(args.test_size, TestSize::Count(28)),
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(
            Cli::try_parse_from(["forecast-prep", "split", "-i", "m4.parquet", "--test-size", "1.5"])
                .is_err()
        );
    }

    #[test]
    fn test_build_config_from_m4_args() {
        let cli = Cli::try_parse_from([
            "forecast-prep",
            "--raw-dir",
            "fixtures",
            "m4",
            "--n-per-category",
            "3",
            "--required-days",
            "10",
        ])
        .unwrap();
        let command = cli.command.as_ref().unwrap();
        let config = build_config(&cli, command).unwrap();
        assert_eq!(config.raw_data_dir, PathBuf::from("fixtures"));
        assert_eq!(config.n_per_category, 3);
        assert_eq!(config.required_days, Some(10));
        assert_eq!(config.random_state, 42);
    }
}
