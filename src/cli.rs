use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::preview::{PreviewMode, RowsPerPage};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Inspect and clean CSV and Excel datasets",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show shape, missing and duplicate counts, column types, and summary statistics
    Profile(ProfileArgs),
    /// Count how often each value occurs in a column
    Frequency(FrequencyArgs),
    /// Remove missing values or duplicate rows and write the cleaned dataset
    Clean(CleanArgs),
    /// Remove columns and write the reduced dataset
    DropColumns(DropColumnsArgs),
    /// List text columns with fewer than five distinct values
    Candidates(CandidatesArgs),
    /// Replace a categorical column's values with integers
    Remap(RemapArgs),
    /// Show the head, tail, or one page of the dataset
    Preview(PreviewArgs),
    /// Page through the dataset with commands read from stdin
    Browse(BrowseArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// CSV or Excel file to load ('-' reads CSV from stdin)
    #[arg(
        short = 'i',
        long = "input",
        required_unless_present = "url",
        conflicts_with = "url"
    )]
    pub input: Option<PathBuf>,
    /// URL of a CSV file, Excel workbook, or Google Sheets document
    #[arg(long)]
    pub url: Option<String>,
    /// CSV delimiter character; skips automatic detection
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Destination file ('-' for stdout; defaults to the suggested file name)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter used when writing the result
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Print the first rows of the result
    #[arg(long = "table")]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Emit the profile as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FrequencyArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Column to count
    #[arg(short = 'C', long = "column")]
    pub column: String,
    /// Maximum distinct values to display (0 = all)
    #[arg(long, default_value_t = 0)]
    pub top: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum CleanOp {
    /// Drop every row with a missing value
    DropNulls,
    /// Fill text gaps with "Na" and interpolate numeric gaps
    Fill,
    /// Drop rows that repeat an earlier row
    Dedupe,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Cleaning operation to run
    #[arg(long = "op", value_enum)]
    pub op: CleanOp,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct DropColumnsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Comma-separated columns to drop
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct CandidatesArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct RemapArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Text column to remap
    #[arg(long)]
    pub column: String,
    /// Repeatable `value=integer` assignments
    #[arg(long = "map", action = clap::ArgAction::Append, required_unless_present = "mapping")]
    pub map: Vec<String>,
    /// JSON object of value-to-integer assignments
    #[arg(long, conflicts_with = "map")]
    pub mapping: Option<PathBuf>,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Which rows to show
    #[arg(long, value_enum, default_value = "head")]
    pub mode: PreviewMode,
    /// Rows per page in paginated mode
    #[arg(long = "rows-per-page", value_enum, default_value = "20")]
    pub rows_per_page: RowsPerPage,
    /// Zero-based page to show in paginated mode
    #[arg(long, default_value_t = 0)]
    pub page: usize,
    /// Restrict the preview to these comma-separated columns
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Rows per page when browsing starts
    #[arg(long = "rows-per-page", value_enum, default_value = "20")]
    pub rows_per_page: RowsPerPage,
    /// Restrict the view to these comma-separated columns
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
