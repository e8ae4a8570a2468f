//! CSV loading: every `*.csv` in a directory, concatenated.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::record::{RawRecord, ResaleRecord};
use super::table::ResaleTable;
use crate::error::{AdvisorError, Result};

/// What the loader read.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Files read, in load order
    pub files: Vec<PathBuf>,
    /// Rows kept after coercion
    pub rows: usize,
    /// Rows dropped because month, area or price did not parse
    pub skipped_rows: usize,
}

/// Load and concatenate every CSV file directly inside `dir`.
///
/// Files are read in sorted path order.
pub fn load_dir(dir: &Path) -> Result<(ResaleTable, LoadReport)> {
    let pattern = dir.join("*.csv");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(AdvisorError::NoData(dir.to_path_buf()));
    }

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for path in &files {
        let file = File::open(path)?;
        let (mut rows, skipped) = load_reader(file, &path.display().to_string())?;
        debug!("Loaded {} rows ({} skipped) from {}", rows.len(), skipped, path.display());
        report.skipped_rows += skipped;
        records.append(&mut rows);
    }

    if records.is_empty() {
        return Err(AdvisorError::NoData(dir.to_path_buf()));
    }

    report.files = files;
    report.rows = records.len();
    info!(
        "Loaded {} resale records from {} files in {} ({} rows skipped)",
        report.rows,
        report.files.len(),
        dir.display(),
        report.skipped_rows
    );

    Ok((ResaleTable::new(records), report))
}

/// Read one CSV stream. Returns the coerced records and the number of rows
/// that were dropped.
pub fn load_reader<R: Read>(reader: R, source: &str) -> Result<(Vec<ResaleRecord>, usize)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut skipped = 0;

    for result in csv_reader.deserialize::<RawRecord>() {
        match result {
            Ok(raw) => match ResaleRecord::from_raw(raw) {
                Some(record) => records.push(record),
                None => skipped += 1,
            },
            Err(e) if e.is_io_error() => {
                return Err(AdvisorError::Csv {
                    path: source.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                debug!("Skipping malformed row in {}: {}", source, e);
                skipped += 1;
            }
        }
    }

    Ok((records, skipped))
}
