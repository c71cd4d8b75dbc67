//! Missing-value and duplicate remediation.
//!
//! Each operator borrows the working dataset and returns a new one; results
//! are independent of each other and are never chained automatically.

use std::collections::HashSet;

use log::info;

use crate::{
    data::{ColumnType, Value},
    dataset::Dataset,
};

/// Token written into text cells by [`fill_missing`].
pub const FILL_SENTINEL: &str = "Na";

/// Removes every row holding at least one missing value.
pub fn drop_nulls(dataset: &Dataset) -> Dataset {
    let rows = dataset
        .rows()
        .iter()
        .filter(|row| !row.iter().any(Value::is_missing))
        .cloned()
        .collect::<Vec<_>>();
    info!(
        "Dropped {} row(s) containing missing values",
        dataset.row_count() - rows.len()
    );
    dataset.with_rows(rows)
}

/// Fills text gaps with [`FILL_SENTINEL`] and interpolates numeric gaps
/// linearly by row position.
///
/// Numeric gaps without a present value on both sides (leading or trailing
/// runs) stay missing. An integer column whose interpolated values are not
/// all whole numbers becomes a float column.
pub fn fill_missing(dataset: &Dataset) -> Dataset {
    let (mut columns, mut rows) = dataset.clone().into_parts();
    let mut filled = 0usize;
    for (idx, column) in columns.iter_mut().enumerate() {
        match column.datatype {
            ColumnType::Text => {
                for row in rows.iter_mut() {
                    if row[idx].is_missing() {
                        row[idx] = Value::Text(FILL_SENTINEL.to_string());
                        filled += 1;
                    }
                }
            }
            ColumnType::Integer | ColumnType::Float => {
                let series = rows.iter().map(|row| row[idx].as_f64()).collect::<Vec<_>>();
                let interpolated = interpolate_linear(&series);
                let promote = column.datatype == ColumnType::Integer
                    && interpolated.iter().flatten().any(|v| v.fract() != 0.0);
                if promote {
                    column.datatype = ColumnType::Float;
                }
                for (row, fill) in rows.iter_mut().zip(&interpolated) {
                    row[idx] = match (&row[idx], *fill, column.datatype) {
                        (Value::Integer(i), _, ColumnType::Float) => Value::Float(*i as f64),
                        (Value::Missing, Some(v), ColumnType::Integer) => {
                            filled += 1;
                            Value::Integer(v as i64)
                        }
                        (Value::Missing, Some(v), _) => {
                            filled += 1;
                            Value::Float(v)
                        }
                        (present, _, _) => present.clone(),
                    };
                }
            }
            ColumnType::Boolean => {}
        }
    }
    info!("Filled {filled} missing value(s)");
    Dataset::from_parts(columns, rows)
}

/// Keeps the first occurrence of every distinct row, in order.
pub fn deduplicate(dataset: &Dataset) -> Dataset {
    let mut seen = HashSet::with_capacity(dataset.row_count());
    let rows = dataset
        .rows()
        .iter()
        .filter(|row| seen.insert(row.as_slice()))
        .cloned()
        .collect::<Vec<_>>();
    info!(
        "Removed {} duplicate row(s)",
        dataset.row_count() - rows.len()
    );
    dataset.with_rows(rows)
}

/// Linear interpolation over gaps bounded by present values on both sides.
pub fn interpolate_linear(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut output = series.to_vec();
    let mut previous: Option<(usize, f64)> = None;
    for (idx, value) in series.iter().enumerate() {
        let Some(current) = *value else {
            continue;
        };
        if let Some((start, start_value)) = previous
            && idx > start + 1
        {
            let span = (idx - start) as f64;
            for (offset, slot) in output[start + 1..idx].iter_mut().enumerate() {
                let step = (offset + 1) as f64 / span;
                *slot = Some(start_value + (current - start_value) * step);
            }
        }
        previous = Some((idx, current));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_csv;
    use encoding_rs::UTF_8;

    fn dataset(csv: &str) -> Dataset {
        parse_csv(csv.as_bytes(), b',', UTF_8).expect("parse")
    }

    #[test]
    fn interpolate_leaves_boundary_gaps_missing() {
        let series = [None, Some(1.0), None, None, Some(4.0), None];
        assert_eq!(
            interpolate_linear(&series),
            vec![None, Some(1.0), Some(2.0), Some(3.0), Some(4.0), None]
        );
    }

    #[test]
    fn fill_missing_uses_sentinel_for_text() {
        let data = dataset("name,score\nann,1\n,2\n");
        let filled = fill_missing(&data);
        assert_eq!(filled.rows()[1][0], Value::Text(FILL_SENTINEL.into()));
        assert_eq!(data.rows()[1][0], Value::Missing);
    }

    #[test]
    fn fill_missing_promotes_integer_columns_with_fractional_fills() {
        let data = dataset("n,m\n1,10\n,\n2,30\n");
        let filled = fill_missing(&data);
        assert_eq!(filled.columns()[0].datatype, ColumnType::Float);
        assert_eq!(filled.rows()[1][0], Value::Float(1.5));
        assert_eq!(filled.columns()[1].datatype, ColumnType::Integer);
        assert_eq!(filled.rows()[1][1], Value::Integer(20));
    }

    #[test]
    fn drop_nulls_keeps_complete_rows_in_order() {
        let data = dataset("a,b\n1,x\n,y\n3,z\n4,\n");
        let dropped = drop_nulls(&data);
        assert_eq!(dropped.row_count(), 2);
        assert_eq!(dropped.rows()[1][0], Value::Integer(3));
    }

    #[test]
    fn deduplicate_keeps_first_occurrence() {
        let data = dataset("a,b\n2,y\n1,x\n2,y\n1,x\n3,z\n");
        let deduped = deduplicate(&data);
        let firsts = deduped
            .rows()
            .iter()
            .map(|row| row[0].clone())
            .collect::<Vec<_>>();
        assert_eq!(
            firsts,
            vec![Value::Integer(2), Value::Integer(1), Value::Integer(3)]
        );
    }
}
