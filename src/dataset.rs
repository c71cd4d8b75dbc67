//! The in-memory table every operation reads and produces.
//!
//! A [`Dataset`] owns an ordered list of typed columns and a row-major grid of
//! [`Value`]s. Operators never mutate a dataset in place: each one borrows its
//! input and builds a new value, so views rendered from an earlier result are
//! never affected by a later operation.

use std::{
    collections::{HashMap, HashSet},
    ops::Range,
};

use serde::Serialize;

use crate::{
    data::{ColumnType, TypeCandidate, Value, boolean_label, parse_typed_value},
    error::{Result, StationError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub datatype: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, datatype: ColumnType) -> Self {
        Self {
            name: name.into(),
            datatype,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Builds a dataset from typed parts, checking row widths and that every
    /// present value agrees with its column type.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(StationError::Validation(format!(
                    "Row {} has {} value(s) but the dataset has {} column(s)",
                    row_idx + 1,
                    row.len(),
                    columns.len()
                )));
            }
            for (value, column) in row.iter().zip(&columns) {
                if !value_fits(value, column.datatype) {
                    return Err(StationError::Validation(format!(
                        "Row {} column '{}' holds {:?}, expected {}",
                        row_idx + 1,
                        column.name,
                        value,
                        column.datatype
                    )));
                }
            }
        }
        Ok(Self { columns, rows })
    }

    /// Infers a type per column from raw text cells and parses every cell.
    /// Short rows are padded with missing cells; blank header names become
    /// `Unnamed: <index>` and repeated names get `.1`, `.2`, ... suffixes.
    pub fn from_raw(headers: Vec<String>, raw_rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let mut candidates = vec![TypeCandidate::default(); width];
        for row in &raw_rows {
            for (candidate, cell) in candidates.iter_mut().zip(row) {
                candidate.observe(cell);
            }
        }
        let names = headers
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                if name.trim().is_empty() {
                    format!("Unnamed: {idx}")
                } else {
                    name
                }
            })
            .collect::<Vec<_>>();
        let columns = disambiguate_names(names)
            .into_iter()
            .zip(&candidates)
            .map(|(name, candidate)| Column::new(name, candidate.decide()))
            .collect::<Vec<_>>();
        let rows = raw_rows
            .iter()
            .map(|raw| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| {
                        let cell = raw.get(idx).map(String::as_str).unwrap_or("");
                        parse_typed_value(cell, column.datatype)
                    })
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| StationError::unknown_column(name))
    }

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Same columns, different rows. Callers guarantee row shape.
    pub(crate) fn with_rows(&self, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<Column>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }

    pub(crate) fn from_parts(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Restricts the dataset to `names`, in the order given. An empty
    /// selection keeps every column.
    pub fn select_columns(&self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self.clone());
        }
        let indices = names
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>>>()?;
        let columns = indices.iter().map(|&idx| self.columns[idx].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
            .collect();
        Ok(Self { columns, rows })
    }

    /// Rows in `range`, clamped to the dataset bounds.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        self.with_rows(self.rows[start..end].to_vec())
    }

    pub fn head(&self, n: usize) -> Self {
        self.slice(0..n)
    }

    pub fn tail(&self, n: usize) -> Self {
        let total = self.rows.len();
        self.slice(total.saturating_sub(n)..total)
    }

    /// Head followed by tail. Short datasets show overlapping rows twice.
    pub fn head_and_tail(&self, n: usize) -> Self {
        let mut rows = self.head(n).rows;
        rows.extend(self.tail(n).rows);
        self.with_rows(rows)
    }

    /// Re-types boolean columns as text so later comparisons and displays
    /// see `True`/`False` strings.
    pub fn coerce_booleans_to_text(self) -> Self {
        let targets = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.datatype == ColumnType::Boolean)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        if targets.is_empty() {
            return self;
        }
        let (mut columns, mut rows) = self.into_parts();
        for &idx in &targets {
            columns[idx].datatype = ColumnType::Text;
        }
        for row in &mut rows {
            for &idx in &targets {
                if let Value::Boolean(b) = row[idx] {
                    row[idx] = Value::Text(boolean_label(b).to_string());
                }
            }
        }
        Self { columns, rows }
    }
}

/// Renames repeated header names to `name.1`, `name.2`, ... in order of
/// appearance, skipping suffixes already used by another header.
fn disambiguate_names(names: Vec<String>) -> Vec<String> {
    let mut taken = names.iter().cloned().collect::<HashSet<_>>();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(names.len());
    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            *count = 1;
            unique.push(name);
            continue;
        }
        let mut renamed = format!("{name}.{count}");
        while taken.contains(&renamed) {
            *count += 1;
            renamed = format!("{name}.{count}");
        }
        *count += 1;
        taken.insert(renamed.clone());
        unique.push(renamed);
    }
    unique
}

fn value_fits(value: &Value, datatype: ColumnType) -> bool {
    matches!(
        (value, datatype),
        (Value::Missing, _)
            | (Value::Integer(_), ColumnType::Integer)
            | (Value::Float(_), ColumnType::Float)
            | (Value::Text(_), ColumnType::Text)
            | (Value::Boolean(_), ColumnType::Boolean)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn sample() -> Dataset {
        Dataset::from_raw(
            vec!["id".into(), "flag".into(), "".into()],
            raw(&[&["1", "true", "a"], &["2", "false", ""], &["3", "", "c"]]),
        )
    }

    #[test]
    fn from_raw_infers_types_and_names_blank_headers() {
        let dataset = sample();
        assert_eq!(dataset.columns()[0].datatype, ColumnType::Integer);
        assert_eq!(dataset.columns()[1].datatype, ColumnType::Boolean);
        assert_eq!(dataset.columns()[2].name, "Unnamed: 2");
        assert_eq!(dataset.rows()[1][2], Value::Missing);
    }

    #[test]
    fn from_raw_suffixes_repeated_header_names() {
        let dataset = Dataset::from_raw(
            vec!["a".into(), "a".into(), "a.1".into(), "a".into(), "".into(), "".into()],
            raw(&[&["1", "x", "y", "z", "p", "q"]]),
        );
        assert_eq!(
            dataset.column_names(),
            vec!["a", "a.2", "a.1", "a.3", "Unnamed: 4", "Unnamed: 5"]
        );
        assert_eq!(dataset.column_index("a.2"), Some(1));
        assert_eq!(dataset.columns()[0].datatype, ColumnType::Integer);
        assert_eq!(dataset.columns()[1].datatype, ColumnType::Text);
    }

    #[test]
    fn coerce_booleans_to_text_keeps_missing_cells() {
        let dataset = sample().coerce_booleans_to_text();
        assert_eq!(dataset.columns()[1].datatype, ColumnType::Text);
        assert_eq!(dataset.rows()[0][1], Value::Text("True".into()));
        assert_eq!(dataset.rows()[2][1], Value::Missing);
    }

    #[test]
    fn new_rejects_mistyped_values() {
        let err = Dataset::new(
            vec![Column::new("n", ColumnType::Integer)],
            vec![vec![Value::Text("x".into())]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn head_and_tail_windows_clamp_to_bounds() {
        let dataset = sample();
        assert_eq!(dataset.head(5).row_count(), 3);
        assert_eq!(dataset.tail(2).rows()[0][0], Value::Integer(2));
        assert_eq!(dataset.head_and_tail(2).row_count(), 4);
        assert_eq!(dataset.slice(10..20).row_count(), 0);
    }

    #[test]
    fn select_columns_preserves_requested_order() {
        let dataset = sample();
        let picked = dataset
            .select_columns(&["Unnamed: 2".into(), "id".into()])
            .unwrap();
        assert_eq!(picked.column_names(), vec!["Unnamed: 2", "id"]);
        assert!(dataset.select_columns(&["nope".into()]).is_err());
    }
}
