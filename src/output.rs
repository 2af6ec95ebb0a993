//! Reading and writing the tables the analysis consumes and produces.
//!
//! Position snapshots and speeding results are CSV; schedules and punctuality reports are JSON.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing::{debug, info};

use crate::analysis::punctuality::PunctualityReport;
use crate::records::{Observation, SpeedingRecord, StopSchedule};

/// Logs a punctuality report as pretty-printed JSON.
pub fn print_json(report: &PunctualityReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Appends rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

fn read_csv<T: DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open '{path}'"))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result.with_context(|| format!("Malformed row in '{path}'"))?;
        rows.push(record);
    }

    Ok(rows)
}

/// Loads a position table written by the collector (or any CSV with the same column names).
pub fn load_observations(path: &str) -> Result<Vec<Observation>> {
    let rows = read_csv(path)?;
    debug!(path, rows = rows.len(), "Positions loaded");
    Ok(rows)
}

/// Loads stop timetables from a JSON array.
pub fn load_schedules(path: &str) -> Result<Vec<StopSchedule>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read '{path}'"))?;
    let stops: Vec<StopSchedule> =
        serde_json::from_str(&content).with_context(|| format!("Malformed schedule '{path}'"))?;
    debug!(path, stops = stops.len(), "Schedules loaded");
    Ok(stops)
}

/// Writes the speeding table, replacing any existing file.
pub fn write_speeding(path: &str, records: &[SpeedingRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a punctuality report as pretty-printed JSON, replacing any existing file.
pub fn write_report(path: &str, report: &PunctualityReport) -> Result<()> {
    let body = serde_json::to_vec_pretty(report)?;
    std::fs::write(path, body).with_context(|| format!("Failed to write '{path}'"))?;
    Ok(())
}
