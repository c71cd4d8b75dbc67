//! Read-only summaries of a dataset.
//!
//! Nothing in this module mutates its input. Numeric summaries follow the
//! usual `count / mean / std / min / 25% / 50% / 75% / max` layout with sample
//! standard deviation and linearly interpolated quantiles; non-numeric
//! columns get `count / unique / top / freq`.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::{
    data::{ColumnType, Value},
    dataset::Dataset,
    error::Result,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub missing: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub datatype: ColumnType,
    pub non_null: usize,
    pub nulls: usize,
    pub unique: usize,
}

impl ColumnProfile {
    pub fn render_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.datatype.to_string(),
            self.non_null.to_string(),
            self.nulls.to_string(),
            self.unique.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q1: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    fn from_values(column: &str, mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        let count = values.len();
        let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|mean| {
            let squares = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
            (squares / (count as f64 - 1.0)).sqrt()
        });
        Self {
            column: column.to_string(),
            count,
            mean,
            std,
            min: values.first().copied(),
            q1: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q3: quantile(&values, 0.75),
            max: values.last().copied(),
        }
    }

    pub fn render_row(&self) -> Vec<String> {
        let metric = |value: Option<f64>| value.map(format_number).unwrap_or_default();
        vec![
            self.column.clone(),
            self.count.to_string(),
            metric(self.mean),
            metric(self.std),
            metric(self.min),
            metric(self.q1),
            metric(self.median),
            metric(self.q3),
            metric(self.max),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

impl CategoricalSummary {
    pub fn render_row(&self) -> Vec<String> {
        vec![
            self.column.clone(),
            self.count.to_string(),
            self.unique.to_string(),
            self.top.clone().unwrap_or_default(),
            self.freq.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: Value,
    pub count: usize,
}

/// Everything the profile view shows, bundled for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub overview: Overview,
    pub columns: Vec<ColumnProfile>,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
}

pub fn profile(dataset: &Dataset) -> Profile {
    Profile {
        overview: overview(dataset),
        columns: column_profiles(dataset),
        numeric: describe_numeric(dataset),
        categorical: describe_categorical(dataset),
    }
}

pub fn overview(dataset: &Dataset) -> Overview {
    Overview {
        rows: dataset.row_count(),
        columns: dataset.column_count(),
        missing: total_nulls(dataset),
        duplicates: duplicate_count(dataset),
    }
}

pub fn null_counts(dataset: &Dataset) -> Vec<(String, usize)> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let nulls = dataset.column_values(idx).filter(|v| v.is_missing()).count();
            (column.name.clone(), nulls)
        })
        .collect()
}

pub fn total_nulls(dataset: &Dataset) -> usize {
    dataset
        .rows()
        .iter()
        .map(|row| row.iter().filter(|v| v.is_missing()).count())
        .sum()
}

/// Rows that repeat an earlier row exactly.
pub fn duplicate_count(dataset: &Dataset) -> usize {
    let mut seen = HashSet::with_capacity(dataset.row_count());
    dataset
        .rows()
        .iter()
        .filter(|row| !seen.insert(row.as_slice()))
        .count()
}

pub fn column_profiles(dataset: &Dataset) -> Vec<ColumnProfile> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let present = dataset
                .column_values(idx)
                .filter(|v| !v.is_missing())
                .collect::<Vec<_>>();
            let unique = present.iter().collect::<HashSet<_>>().len();
            ColumnProfile {
                name: column.name.clone(),
                datatype: column.datatype,
                non_null: present.len(),
                nulls: dataset.row_count() - present.len(),
                unique,
            }
        })
        .collect()
}

pub fn describe_numeric(dataset: &Dataset) -> Vec<NumericSummary> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| column.datatype.is_numeric())
        .map(|(idx, column)| {
            let values = dataset.column_values(idx).filter_map(Value::as_f64).collect();
            NumericSummary::from_values(&column.name, values)
        })
        .collect()
}

pub fn describe_categorical(dataset: &Dataset) -> Vec<CategoricalSummary> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| !column.datatype.is_numeric())
        .map(|(idx, column)| {
            let counts = tally(dataset.column_values(idx));
            let top = counts.first();
            CategoricalSummary {
                column: column.name.clone(),
                count: counts.iter().map(|c| c.count).sum(),
                unique: counts.len(),
                top: top.map(|c| c.value.as_field()),
                freq: top.map(|c| c.count).unwrap_or(0),
            }
        })
        .collect()
}

/// Occurrences of each non-missing value in `column`, most frequent first.
pub fn value_counts(dataset: &Dataset, column: &str) -> Result<Vec<ValueCount>> {
    let idx = dataset.require_column(column)?;
    Ok(tally(dataset.column_values(idx)))
}

/// Ties keep first-seen order.
fn tally<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<ValueCount> {
    let mut counts: HashMap<&Value, (usize, usize)> = HashMap::new();
    for (position, value) in values.filter(|v| !v.is_missing()).enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }
    let mut items = counts.into_iter().collect::<Vec<_>>();
    items.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
    items
        .into_iter()
        .map(|(value, (count, _))| ValueCount {
            value: value.clone(),
            count,
        })
        .collect()
}

fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(csv: &str) -> Dataset {
        crate::loader::parse_csv(csv.as_bytes(), b',', encoding_rs::UTF_8).expect("parse")
    }

    #[test]
    fn quantile_interpolates_between_ranks() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&[7.0], 0.75), Some(7.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn numeric_summary_uses_sample_std() {
        let data = dataset("x\n2\n4\n4\n4\n5\n5\n7\n9\n");
        let summary = &describe_numeric(&data)[0];
        assert_eq!(summary.count, 8);
        assert_eq!(summary.mean, Some(5.0));
        let std = summary.std.unwrap();
        assert!((std - 2.138089935).abs() < 1e-6);
        assert_eq!(summary.min, Some(2.0));
        assert_eq!(summary.max, Some(9.0));
    }

    #[test]
    fn single_value_has_no_std() {
        let data = dataset("x,y\n3,a\n,b\n");
        let summary = &describe_numeric(&data)[0];
        assert_eq!(summary.count, 1);
        assert_eq!(summary.std, None);
    }

    #[test]
    fn categorical_summary_breaks_ties_by_first_occurrence() {
        let data = dataset("plan\nno\nyes\nyes\nno\n\nmaybe\n");
        let summary = &describe_categorical(&data)[0];
        assert_eq!(summary.count, 5);
        assert_eq!(summary.unique, 3);
        assert_eq!(summary.top.as_deref(), Some("no"));
        assert_eq!(summary.freq, 2);
    }

    #[test]
    fn duplicate_count_counts_repeats_only() {
        let data = dataset("a,b\n1,x\n1,x\n1,x\n2,\n2,\n3,y\n");
        assert_eq!(duplicate_count(&data), 3);
        assert_eq!(total_nulls(&data), 2);
    }

    #[test]
    fn column_profiles_report_nulls_and_uniques() {
        let data = dataset("a,b\n1,x\n1,\n2,y\n");
        let profiles = column_profiles(&data);
        assert_eq!(profiles[0].unique, 2);
        assert_eq!(profiles[1].nulls, 1);
        assert_eq!(profiles[1].non_null, 2);
        assert_eq!(profiles[1].datatype, ColumnType::Text);
    }

    #[test]
    fn value_counts_rejects_unknown_columns() {
        let data = dataset("a\n1\n");
        assert!(value_counts(&data, "b").is_err());
    }
}
