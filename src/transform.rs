//! Column removal and categorical-to-integer remapping.

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    data::{ColumnType, Value},
    dataset::Dataset,
    error::{Result, StationError},
};

/// Text columns need fewer than this many distinct values to be remapped.
pub const REMAP_MAX_DISTINCT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    NothingToDo,
    Dropped(Dataset),
}

/// Removes the named columns. An empty selection is reported rather than
/// treated as an error.
pub fn drop_columns(dataset: &Dataset, names: &[String]) -> Result<DropOutcome> {
    if names.is_empty() {
        return Ok(DropOutcome::NothingToDo);
    }
    let doomed = names
        .iter()
        .map(|name| dataset.require_column(name))
        .collect::<Result<HashSet<_>>>()?;
    let keep = (0..dataset.column_count())
        .filter(|idx| !doomed.contains(idx))
        .collect::<Vec<_>>();
    let columns = keep
        .iter()
        .map(|&idx| dataset.columns()[idx].clone())
        .collect();
    let rows = dataset
        .rows()
        .iter()
        .map(|row| keep.iter().map(|&idx| row[idx].clone()).collect())
        .collect();
    info!("{} column(s) dropped: {}", doomed.len(), names.iter().join(", "));
    Ok(DropOutcome::Dropped(Dataset::from_parts(columns, rows)))
}

/// A text column eligible for remapping, with its distinct values in
/// first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemapCandidate {
    pub column: String,
    pub values: Vec<String>,
}

pub fn remap_candidates(dataset: &Dataset) -> Vec<RemapCandidate> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| column.datatype == ColumnType::Text)
        .filter_map(|(idx, column)| {
            let values = dataset
                .column_values(idx)
                .filter_map(|value| match value {
                    Value::Text(text) => Some(text.clone()),
                    _ => None,
                })
                .unique()
                .collect::<Vec<_>>();
            (values.len() < REMAP_MAX_DISTINCT).then(|| RemapCandidate {
                column: column.name.clone(),
                values,
            })
        })
        .collect()
}

/// Value-to-integer assignments for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    entries: BTreeMap<String, u32>,
}

impl MappingTable {
    /// Checks that `entries` assigns a number to every value of the
    /// candidate, and to nothing else.
    pub fn for_candidate(
        candidate: &RemapCandidate,
        entries: impl IntoIterator<Item = (String, u32)>,
    ) -> Result<Self> {
        let table = Self {
            entries: entries.into_iter().collect(),
        };
        let missing = candidate
            .values
            .iter()
            .filter(|value| !table.entries.contains_key(*value))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(StationError::Configuration(format!(
                "No value supplied for {} in column '{}'",
                missing.iter().map(|v| format!("'{v}'")).join(", "),
                candidate.column
            )));
        }
        if let Some(extra) = table
            .entries
            .keys()
            .find(|key| !candidate.values.contains(key))
        {
            return Err(StationError::Configuration(format!(
                "'{extra}' does not occur in column '{}'",
                candidate.column
            )));
        }
        Ok(table)
    }

    /// Parses `value=integer` pairs.
    pub fn parse_pairs(pairs: &[String]) -> Result<Vec<(String, u32)>> {
        pairs
            .iter()
            .map(|pair| {
                let (value, number) = pair.rsplit_once('=').ok_or_else(|| {
                    StationError::Configuration(format!(
                        "Mapping '{pair}' must look like value=integer"
                    ))
                })?;
                let number = number.trim().parse::<u32>().map_err(|_| {
                    StationError::Configuration(format!(
                        "Mapping '{pair}' needs a non-negative integer"
                    ))
                })?;
                Ok((value.to_string(), number))
            })
            .collect()
    }

    pub fn from_json(text: &str) -> Result<Vec<(String, u32)>> {
        let entries: BTreeMap<String, u32> = serde_json::from_str(text)
            .map_err(|err| StationError::Configuration(format!("Invalid mapping JSON: {err}")))?;
        Ok(entries.into_iter().collect())
    }

    pub fn get(&self, value: &str) -> Option<u32> {
        self.entries.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replaces `column` with its mapped integers. Values absent from the table
/// become missing.
pub fn remap(dataset: &Dataset, column: &str, table: &MappingTable) -> Result<Dataset> {
    let idx = dataset.require_column(column)?;
    let (mut columns, mut rows) = dataset.clone().into_parts();
    columns[idx].datatype = ColumnType::Integer;
    let mut unmapped = 0usize;
    for row in &mut rows {
        let mapped = match &row[idx] {
            Value::Missing => None,
            other => table.get(&other.as_field()),
        };
        if mapped.is_none() && !row[idx].is_missing() {
            unmapped += 1;
        }
        row[idx] = mapped.map_or(Value::Missing, |n| Value::Integer(i64::from(n)));
    }
    info!("Column '{column}' mapped ({unmapped} unmapped value(s) set to missing)");
    Ok(Dataset::from_parts(columns, rows))
}
