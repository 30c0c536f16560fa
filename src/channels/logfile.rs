//! # Durable CSV Log
//!
//! Append-only storage channel: one CSV line per received,
//! integrity-valid frame.
//!
//! Each process start opens a fresh file named `GPSlogNNNN.csv`, one
//! number higher than the highest already on the storage medium, so a
//! watchdog restart never clobbers an earlier session. An unusable
//! storage directory is a fatal startup error; a failed append during
//! steady state is only logged.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::{BaseError, Result};
use crate::record::TelemetryRecord;

/// Log file name pattern: GPSlog0001.csv .. GPSlog9999.csv
const LOG_PREFIX: &str = "GPSlog";
const LOG_SUFFIX: &str = ".csv";
const MAX_LOG_INDEX: u32 = 9999;

/// CSV column header written at the top of every log file
const CSV_HEADER: &str = "timestamp,remote_ID,GPSFix,latitude,longitude,voltage,rssi";

/// Append-only CSV session log.
pub struct CsvLog {
    path: PathBuf,
    file: File,
}

impl CsvLog {
    /// Open a new session log in `dir`, numbered after the highest
    /// existing `GPSlogNNNN.csv`.
    ///
    /// # Errors
    ///
    /// * [`BaseError::Storage`] - directory unusable or file numbers exhausted
    pub fn create(dir: &Path) -> Result<Self> {
        let next = next_log_index(dir)?;
        let path = dir.join(format!("{}{:04}{}", LOG_PREFIX, next, LOG_SUFFIX));

        let mut file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .map_err(|e| BaseError::Storage(format!("cannot create {}: {}", path.display(), e)))?;

        writeln!(file, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "{}", CSV_HEADER)?;
        file.flush()?;

        info!("logfile: {}", path.display());
        Ok(Self { path, file })
    }

    /// Append one record as a CSV line and flush so a watchdog restart
    /// loses at most the line being written.
    pub fn append(&mut self, record: &TelemetryRecord) -> std::io::Result<()> {
        writeln!(
            self.file,
            "{},{},{},{},{},{},{}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.remote_id,
            record.fix_valid,
            record.latitude,
            record.longitude,
            record.battery,
            record.link_rssi,
        )?;
        self.file.flush()
    }

    /// Path of this session's file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Scan `dir` for existing session logs and pick the next free index.
fn next_log_index(dir: &Path) -> Result<u32> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| BaseError::Storage(format!("cannot read {}: {}", dir.display(), e)))?;

    let mut max_index = 0;
    for entry in entries {
        let entry = entry.map_err(|e| BaseError::Storage(e.to_string()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        if let Some(index) = parse_log_index(name) {
            max_index = max_index.max(index);
        }
    }

    if max_index >= MAX_LOG_INDEX {
        return Err(BaseError::Storage(format!(
            "log file numbers exhausted in {} (max {})",
            dir.display(),
            MAX_LOG_INDEX
        )));
    }

    Ok(max_index + 1)
}

/// Extract NNNN from a `GPSlogNNNN.csv` file name.
fn parse_log_index(name: &str) -> Option<u32> {
    name.strip_prefix(LOG_PREFIX)?
        .strip_suffix(LOG_SUFFIX)?
        .parse()
        .ok()
}
