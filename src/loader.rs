//! Turns uploaded bytes or a URL into a [`Dataset`].
//!
//! Format dispatch is a closed set: CSV, Excel workbooks (first sheet), and
//! Google Sheets share links rewritten to their CSV export endpoint. CSV
//! uploads have their delimiter sniffed from the first
//! [`io_utils::SNIFF_SAMPLE_BYTES`] bytes; a failed parse is retried once
//! with a comma before the error is reported.

use std::{io::Cursor, sync::LazyLock, time::Duration};

use calamine::{Data, Reader, Xlsx};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info, warn};
use regex::Regex;
use reqwest::blocking::Client;

use crate::{
    dataset::Dataset,
    error::{Result, StationError},
    io_utils::{self, DEFAULT_CSV_DELIMITER},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const GOOGLE_SHEETS_HOST: &str = "docs.google.com/spreadsheets";

static SHEET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("valid regex"));
static SHEET_GID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"gid=([0-9]+)").expect("valid regex"));

/// Where a dataset comes from.
#[derive(Debug, Clone)]
pub enum Source {
    Upload { file_name: String, bytes: Vec<u8> },
    Url(String),
}

impl Source {
    pub fn label(&self) -> &str {
        match self {
            Source::Upload { file_name, .. } => file_name,
            Source::Url(url) => url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    pub fn from_file_name(name: &str) -> Result<Self> {
        let lowered = name.to_ascii_lowercase();
        if lowered.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else if lowered.ends_with(".xlsx") || lowered.ends_with(".xlsm") {
            Ok(FileFormat::Spreadsheet)
        } else {
            Err(StationError::UnsupportedFormat(name.to_string()))
        }
    }
}

/// A URL after suffix dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlTarget {
    Csv(String),
    Spreadsheet(String),
    GoogleSheet {
        sheet_id: String,
        gid: String,
        export_url: String,
    },
}

impl UrlTarget {
    pub fn resolve(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        if trimmed.ends_with(".csv") {
            return Ok(UrlTarget::Csv(trimmed.to_string()));
        }
        if trimmed.ends_with(".xlsx") {
            return Ok(UrlTarget::Spreadsheet(trimmed.to_string()));
        }
        if trimmed.contains(GOOGLE_SHEETS_HOST) {
            let sheet_id = SHEET_ID
                .captures(trimmed)
                .map(|caps| caps[1].to_string())
                .ok_or_else(|| {
                    StationError::UnsupportedFormat(format!(
                        "Google Sheets link without a spreadsheet id: {trimmed}"
                    ))
                })?;
            let gid = SHEET_GID
                .captures_iter(trimmed)
                .last()
                .map(|caps| caps[1].to_string())
                .unwrap_or_else(|| "0".to_string());
            let export_url = format!(
                "https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv&gid={gid}"
            );
            return Ok(UrlTarget::GoogleSheet {
                sheet_id,
                gid,
                export_url,
            });
        }
        Err(StationError::UnsupportedFormat(trimmed.to_string()))
    }

    pub fn fetch_url(&self) -> &str {
        match self {
            UrlTarget::Csv(url) | UrlTarget::Spreadsheet(url) => url,
            UrlTarget::GoogleSheet { export_url, .. } => export_url,
        }
    }
}

/// Retrieves the bytes behind a URL.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher used outside of tests.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| StationError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching {url}");
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| StationError::Network(err.to_string()))?;
        let bytes = response
            .bytes()
            .map_err(|err| StationError::Network(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Skips sniffing when set.
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

/// A freshly loaded dataset plus the delimiter it was parsed with, if any.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub dataset: Dataset,
    pub delimiter: Option<u8>,
}

pub fn load(source: &Source, options: &LoadOptions, fetcher: &dyn Fetch) -> Result<Loaded> {
    let loaded = match source {
        Source::Upload { file_name, bytes } => match FileFormat::from_file_name(file_name)? {
            FileFormat::Csv => load_csv_upload(bytes, options)?,
            FileFormat::Spreadsheet => Loaded {
                dataset: load_spreadsheet(bytes)?,
                delimiter: None,
            },
        },
        Source::Url(url) => {
            let target = UrlTarget::resolve(url)?;
            debug!("Resolved {url} to {}", target.fetch_url());
            let bytes = fetcher.fetch(target.fetch_url())?;
            match target {
                UrlTarget::Spreadsheet(_) => Loaded {
                    dataset: load_spreadsheet(&bytes)?,
                    delimiter: None,
                },
                UrlTarget::Csv(_) | UrlTarget::GoogleSheet { .. } => {
                    let delimiter = options.delimiter.unwrap_or(DEFAULT_CSV_DELIMITER);
                    Loaded {
                        dataset: parse_csv(&bytes, delimiter, options.encoding)?,
                        delimiter: Some(delimiter),
                    }
                }
            }
        }
    };
    let dataset = loaded.dataset.coerce_booleans_to_text();
    info!(
        "Loaded {} row(s) x {} column(s) from {}",
        dataset.row_count(),
        dataset.column_count(),
        source.label()
    );
    Ok(Loaded {
        dataset,
        delimiter: loaded.delimiter,
    })
}

/// Sniffs the delimiter (unless overridden), parses, and falls back to a
/// comma once if the first attempt fails.
pub fn load_csv_upload(bytes: &[u8], options: &LoadOptions) -> Result<Loaded> {
    let delimiter = options.delimiter.unwrap_or_else(|| {
        let sample = io_utils::sample_head(bytes, options.encoding);
        io_utils::sniff_delimiter(&sample).unwrap_or(DEFAULT_CSV_DELIMITER)
    });
    info!(
        "Detected separator '{}'",
        io_utils::printable_delimiter(delimiter)
    );
    match parse_csv(bytes, delimiter, options.encoding) {
        Ok(dataset) => Ok(Loaded {
            dataset,
            delimiter: Some(delimiter),
        }),
        Err(err) if delimiter != DEFAULT_CSV_DELIMITER => {
            warn!("Parsing with '{}' failed ({err}); retrying with ','", delimiter as char);
            let dataset = parse_csv(bytes, DEFAULT_CSV_DELIMITER, options.encoding)?;
            Ok(Loaded {
                dataset,
                delimiter: Some(DEFAULT_CSV_DELIMITER),
            })
        }
        Err(err) => Err(err),
    }
}

pub fn parse_csv(bytes: &[u8], delimiter: u8, encoding: &'static Encoding) -> Result<Dataset> {
    let text = io_utils::decode_bytes(bytes, encoding).ok_or_else(|| {
        StationError::Load(format!("input is not valid {}", encoding.name()))
    })?;
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let headers = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(StationError::Load("no columns to parse".to_string()));
    }
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record
            .map_err(|err| StationError::Load(format!("reading row {}: {err}", idx + 2)))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Dataset::from_raw(headers, rows))
}

/// Reads the first worksheet; its first row holds the column names.
pub fn load_spreadsheet(bytes: &[u8]) -> Result<Dataset> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|err| StationError::Load(format!("failed to open workbook: {err}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| StationError::Load("workbook has no worksheets".to_string()))?
        .map_err(|err| StationError::Load(format!("failed to read worksheet: {err}")))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows
        .next()
        .ok_or_else(|| StationError::Load("worksheet is empty".to_string()))?;
    Ok(Dataset::from_raw(headers, rows.collect()))
}

pub(crate) fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
