//! Reading raw CSV inputs and persisting processed tables.
//!
//! Outputs are written to a sibling `*.tmp` file first and renamed into place
//! once the write succeeded, so a failed run never leaves a partial file at
//! the final path.

use crate::error::{PrepError, Result, ResultExt};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows scanned for CSV schema inference.
const INFER_SCHEMA_LENGTH: usize = 10_000;

/// Read a headered CSV file into a DataFrame.
///
/// Fails with [`PrepError::InputNotFound`] when the file does not exist.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PrepError::InputNotFound(path.to_path_buf()));
    }

    info!("Reading {}", path.display());
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_LENGTH))
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Opening {}", path.display()))?
        .finish()
        .context(format!("Parsing {}", path.display()))?;

    debug!("Loaded {}: {:?}", path.display(), df.shape());
    Ok(df)
}

/// Read a Parquet file into a DataFrame.
pub fn read_parquet(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PrepError::InputNotFound(path.to_path_buf()));
    }

    let file = File::open(path).context(format!("Opening {}", path.display()))?;
    let df = ParquetReader::new(file)
        .finish()
        .context(format!("Reading {}", path.display()))?;

    debug!("Loaded {}: {:?}", path.display(), df.shape());
    Ok(df)
}

/// Write a DataFrame to `path` as Parquet, creating parent directories.
///
/// The table is written to `<path>.tmp` and renamed over `path` afterwards.
pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context(format!("Creating {}", parent.display()))?;
    }

    let tmp_path = temp_path_for(path);
    let written = (|| -> Result<()> {
        let mut file = File::create(&tmp_path).context(format!("Creating {}", tmp_path.display()))?;
        ParquetWriter::new(&mut file)
            .finish(df)
            .context(format!("Writing {}", tmp_path.display()))?;
        Ok(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).context(format!("Renaming into {}", path.display()))?;
    info!("Saved {} ({} rows x {} columns)", path.display(), df.height(), df.width());
    Ok(path.to_path_buf())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
