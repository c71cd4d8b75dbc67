//! Delimited-text serialization of any dataset variant.

use std::{io::Write, path::Path};

use anyhow::{Context, Result as AnyResult};
use log::info;

use crate::{
    dataset::Dataset,
    error::{Result, StationError},
    io_utils::{self, DEFAULT_CSV_DELIMITER},
};

pub const DROP_NULLS_FILE: &str = "cleaned_missing_removed.csv";
pub const FILL_MISSING_FILE: &str = "cleaned_missing_handled.csv";
pub const DEDUPLICATE_FILE: &str = "cleaned_duplicates_removed.csv";
pub const DROP_COLUMNS_FILE: &str = "dataset_dropped_columns.csv";

pub fn remap_file_name(column: &str) -> String {
    format!("{column}_mapped.csv")
}

/// Bytes ready to hand to a download, with the suggested file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    pub fn new(dataset: &Dataset, file_name: impl Into<String>, delimiter: u8) -> Result<Self> {
        Ok(Self {
            file_name: file_name.into(),
            bytes: to_delimited(dataset, delimiter)?,
        })
    }

    /// Writes to `destination`, or to the suggested file name inside the
    /// current directory when none is given. `-` writes to stdout.
    pub fn save(&self, destination: Option<&Path>) -> AnyResult<String> {
        let path = destination.unwrap_or_else(|| Path::new(&self.file_name));
        let mut writer = io_utils::open_output(path)?;
        writer
            .write_all(&self.bytes)
            .with_context(|| format!("Writing {path:?}"))?;
        writer.flush().context("Flushing output writer")?;
        let label = if io_utils::is_dash(path) {
            "stdout".to_string()
        } else {
            path.display().to_string()
        };
        info!("Wrote {} byte(s) -> {}", self.bytes.len(), label);
        Ok(label)
    }
}

/// Header row plus one record per row; only fields that need it are quoted.
pub fn to_delimited(dataset: &Dataset, delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = io_utils::csv_writer_builder(delimiter).from_writer(Vec::new());
    writer
        .write_record(dataset.columns().iter().map(|c| c.name.as_str()))
        .map_err(|err| StationError::Export(format!("writing header: {err}")))?;
    for (idx, row) in dataset.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(|value| value.as_field()))
            .map_err(|err| StationError::Export(format!("writing row {}: {err}", idx + 1)))?;
    }
    writer
        .into_inner()
        .map_err(|err| StationError::Export(format!("finishing export: {err}")))
}

pub fn to_csv(dataset: &Dataset) -> Result<Vec<u8>> {
    to_delimited(dataset, DEFAULT_CSV_DELIMITER)
}
