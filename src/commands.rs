use std::{
    fs,
    io::{self, Read},
};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};

use crate::{
    clean,
    cli::{
        CandidatesArgs, CleanArgs, CleanOp, DropColumnsArgs, FrequencyArgs, OutputArgs,
        PreviewArgs, ProfileArgs, RemapArgs, SourceArgs,
    },
    dataset::Dataset,
    error::StationError,
    export::{self, DownloadArtifact},
    io_utils::{self, DEFAULT_CSV_DELIMITER},
    loader::{HttpFetcher, LoadOptions, Source},
    preview::{PREVIEW_ROWS, Preview},
    profile::{self, Profile},
    session::Session,
    table,
    transform::{self, DropOutcome, MappingTable},
};

const STDIN_FILE_NAME: &str = "stdin.csv";

/// Loads the source named on the command line into a fresh session.
pub fn open_session(args: &SourceArgs) -> Result<Session> {
    let options = LoadOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    };
    let source = resolve_source(args)?;
    let fetcher = HttpFetcher::new().context("Creating HTTP client")?;
    let mut session = Session::new();
    session
        .load(&source, &options, &fetcher)
        .with_context(|| format!("Loading {}", source.label()))?;
    Ok(session)
}

fn resolve_source(args: &SourceArgs) -> Result<Source> {
    if let Some(url) = &args.url {
        return Ok(Source::Url(url.trim().to_string()));
    }
    let path = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("Provide --input or --url"))?;
    if io_utils::is_dash(path) {
        let mut bytes = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Reading CSV from stdin")?;
        return Ok(Source::Upload {
            file_name: STDIN_FILE_NAME.to_string(),
            bytes,
        });
    }
    let bytes = fs::read(path).with_context(|| format!("Reading {path:?}"))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Source::Upload { file_name, bytes })
}

pub fn profile(args: &ProfileArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let report = profile::profile(session.dataset()?);
    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Serializing profile")?;
        println!("{json}");
    } else {
        print_profile(&report);
    }
    Ok(())
}

fn print_profile(report: &Profile) {
    let overview = &report.overview;
    println!("Rows: {}", overview.rows);
    println!("Columns: {}", overview.columns);
    println!("Missing values: {}", overview.missing);
    println!("Duplicate rows: {}", overview.duplicates);

    println!();
    println!("Data Types");
    table::print_table(
        &headers(&["column", "type", "non-null", "null", "unique"]),
        &report
            .columns
            .iter()
            .map(|column| column.render_row())
            .collect::<Vec<_>>(),
    );

    if !report.numeric.is_empty() {
        println!();
        println!("Statistical Summary");
        table::print_table(
            &headers(&[
                "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
            ]),
            &report
                .numeric
                .iter()
                .map(|summary| summary.render_row())
                .collect::<Vec<_>>(),
        );
    }

    if !report.categorical.is_empty() {
        println!();
        println!("Non-Numeric Summary");
        table::print_table(
            &headers(&["column", "count", "unique", "top", "freq"]),
            &report
                .categorical
                .iter()
                .map(|summary| summary.render_row())
                .collect::<Vec<_>>(),
        );
    }
}

pub fn frequency(args: &FrequencyArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let dataset = session.dataset()?;
    let counts = profile::value_counts(dataset, &args.column)?;
    let total = counts.iter().map(|entry| entry.count).sum::<usize>();
    let limit = if args.top == 0 { counts.len() } else { args.top };
    let rows = counts
        .iter()
        .take(limit)
        .map(|entry| {
            let percent = if total == 0 {
                0.0
            } else {
                entry.count as f64 * 100.0 / total as f64
            };
            vec![
                entry.value.as_display(),
                entry.count.to_string(),
                format!("{percent:.2}%"),
            ]
        })
        .collect::<Vec<_>>();
    info!(
        "Column '{}' holds {} distinct value(s)",
        args.column,
        counts.len()
    );
    table::print_table(&headers(&["value", "count", "percent"]), &rows);
    Ok(())
}

pub fn clean(args: &CleanArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let dataset = session.dataset()?;
    let (cleaned, file_name) = match args.op {
        CleanOp::DropNulls => (clean::drop_nulls(dataset), export::DROP_NULLS_FILE),
        CleanOp::Fill => (clean::fill_missing(dataset), export::FILL_MISSING_FILE),
        CleanOp::Dedupe => (clean::deduplicate(dataset), export::DEDUPLICATE_FILE),
    };
    write_artifact(&cleaned, file_name, &args.output)
}

pub fn drop_columns(args: &DropColumnsArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let columns = trimmed(&args.columns);
    match transform::drop_columns(session.dataset()?, &columns)? {
        DropOutcome::NothingToDo => {
            println!("No columns selected.");
            Ok(())
        }
        DropOutcome::Dropped(reduced) => {
            write_artifact(&reduced, export::DROP_COLUMNS_FILE, &args.output)
        }
    }
}

pub fn candidates(args: &CandidatesArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let candidates = transform::remap_candidates(session.dataset()?);
    if candidates.is_empty() {
        println!("No categorical columns with fewer than five distinct values.");
        return Ok(());
    }
    let rows = candidates
        .iter()
        .map(|candidate| {
            vec![
                candidate.column.clone(),
                candidate.values.len().to_string(),
                candidate.values.join(", "),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers(&["column", "distinct", "values"]), &rows);
    Ok(())
}

pub fn remap(args: &RemapArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let dataset = session.dataset()?;
    let candidate = transform::remap_candidates(dataset)
        .into_iter()
        .find(|candidate| candidate.column == args.column)
        .ok_or_else(|| {
            if dataset.column_index(&args.column).is_some() {
                StationError::Validation(format!(
                    "Column '{}' is not a categorical column with fewer than {} distinct values",
                    args.column,
                    transform::REMAP_MAX_DISTINCT
                ))
            } else {
                StationError::unknown_column(&args.column)
            }
        })?;
    let entries = match &args.mapping {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("Reading mapping {path:?}"))?;
            MappingTable::from_json(&text)
                .with_context(|| format!("Parsing mapping {path:?}"))?
        }
        None => MappingTable::parse_pairs(&args.map)?,
    };
    let table = MappingTable::for_candidate(&candidate, entries)?;
    debug!("Mapping {} value(s) in '{}'", table.len(), args.column);
    let json = serde_json::to_string_pretty(&table).context("Serializing mapping")?;
    eprintln!("{json}");
    let mapped = transform::remap(dataset, &args.column, &table)?;
    write_artifact(&mapped, &export::remap_file_name(&args.column), &args.output)
}

pub fn preview(args: &PreviewArgs) -> Result<()> {
    let mut session = open_session(&args.source)?;
    session.set_preview_mode(args.mode);
    session.set_rows_per_page(args.rows_per_page)?;
    session.go_to_page(args.page)?;
    let preview = session.preview(&trimmed(&args.columns))?;
    print!("{}", render_preview(&preview));
    Ok(())
}

/// Caption lines (paginated mode only) followed by the grid.
pub fn render_preview(preview: &Preview) -> String {
    let mut output = String::new();
    if let Preview::Page(view) = preview {
        output.push_str(&view.caption());
        output.push('\n');
        output.push_str(&view.page_label());
        output.push('\n');
    }
    output.push_str(&table::render_dataset(
        preview.data(),
        &preview.row_numbers(),
    ));
    output
}

fn write_artifact(dataset: &Dataset, file_name: &str, output: &OutputArgs) -> Result<()> {
    let delimiter = output.output_delimiter.unwrap_or(DEFAULT_CSV_DELIMITER);
    let artifact = DownloadArtifact::new(dataset, file_name, delimiter)?;
    let destination = output.output.as_deref();
    let written_to = artifact
        .save(destination)
        .with_context(|| format!("Saving {}", artifact.file_name))?;
    if output.table && !destination.is_some_and(io_utils::is_dash) {
        let shown = dataset.head(PREVIEW_ROWS);
        let numbers = (0..shown.row_count()).collect::<Vec<_>>();
        table::print_dataset(&shown, &numbers);
    }
    info!(
        "{} row(s) x {} column(s) saved to {}",
        dataset.row_count(),
        dataset.column_count(),
        written_to
    );
    Ok(())
}

fn trimmed(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect()
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
