use std::borrow::Cow;
use std::fmt::Write as _;

use crate::dataset::Dataset;

/// Renders a dataset as a plain-text grid. Each line starts with the row's
/// label from `row_numbers`, falling back to its position.
pub fn render_dataset(dataset: &Dataset, row_numbers: &[usize]) -> String {
    let mut headers = vec![String::new()];
    headers.extend(dataset.column_names());
    let rows = dataset
        .rows()
        .iter()
        .enumerate()
        .map(|(offset, row)| {
            let label = row_numbers.get(offset).copied().unwrap_or(offset);
            let mut cells = vec![label.to_string()];
            cells.extend(row.iter().map(|value| value.as_display()));
            cells
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_cells, &separator_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

pub fn print_dataset(dataset: &Dataset, row_numbers: &[usize]) {
    print!("{}", render_dataset(dataset, row_numbers));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
