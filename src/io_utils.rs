//! I/O utilities for CSV reading, writing, decoding, and delimiter sniffing.
//!
//! - **Delimiter sniffing**: [`sniff_delimiter`] inspects a sample of the
//!   input and picks the candidate that splits every line consistently.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Reader/writer construction**: [`open_csv_reader`] and
//!   [`csv_writer_builder`] build `csv` readers and writers with the station's
//!   quoting rules.
//! - **stdout**: the `-` path convention routes output through stdout.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

/// Bytes read from the head of an upload when sniffing its delimiter.
pub const SNIFF_SAMPLE_BYTES: usize = 2048;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const MIN_CONSISTENCY: f64 = 0.9;

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Decodes `bytes`, stripping a leading byte-order mark. A UTF-8 or UTF-16
/// BOM overrides `encoding`. Returns `None` when the bytes are not valid in
/// the encoding actually used.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Lossy decode of the first [`SNIFF_SAMPLE_BYTES`] bytes with the same BOM
/// handling as [`decode_bytes`], so the sample matches the parsed text.
pub fn sample_head(bytes: &[u8], encoding: &'static Encoding) -> String {
    let end = bytes.len().min(SNIFF_SAMPLE_BYTES);
    encoding.decode(&bytes[..end]).0.into_owned()
}

/// Picks the delimiter that occurs the same number of times on (nearly)
/// every sampled line. Returns `None` when no candidate is consistent.
pub fn sniff_delimiter(sample: &str) -> Option<u8> {
    let mut lines = sample
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    // A sample cut at the byte limit usually ends mid-line.
    if sample.len() >= SNIFF_SAMPLE_BYTES && lines.len() > 1 {
        lines.pop();
    }
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, f64, usize)> = None;
    for delimiter in CANDIDATE_DELIMITERS {
        let counts = lines
            .iter()
            .map(|line| count_unquoted(line, delimiter))
            .collect::<Vec<_>>();
        let Some(modal) = modal_count(&counts) else {
            continue;
        };
        let agreeing = counts.iter().filter(|&&c| c == modal).count();
        let consistency = agreeing as f64 / counts.len() as f64;
        if consistency < MIN_CONSISTENCY {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, best_consistency, best_modal)) => {
                consistency > best_consistency
                    || (consistency == best_consistency && modal > best_modal)
            }
        };
        if better {
            best = Some((delimiter, consistency, modal));
        }
    }
    best.map(|(delimiter, _, _)| delimiter)
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Most frequent non-zero count, preferring the larger count on ties.
fn modal_count(counts: &[usize]) -> Option<usize> {
    let mut tallies: Vec<(usize, usize)> = Vec::new();
    for &count in counts.iter().filter(|&&c| c > 0) {
        match tallies.iter_mut().find(|(value, _)| *value == count) {
            Some((_, tally)) => *tally += 1,
            None => tallies.push((count, 1)),
        }
    }
    tallies
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(value, _)| value)
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn csv_writer_builder(delimiter: u8) -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder
}

/// Opens a file (or stdout for `-`) to receive exported bytes.
pub fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if is_dash(path) {
        Ok(Box::new(std::io::stdout()))
    } else {
        Ok(Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        )))
    }
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn sniff_prefers_consistent_semicolons() {
        let sample = "name;city;note\nAna;Lisbon;a, b\nBo;Oslo;c, d\n";
        assert_eq!(sniff_delimiter(sample), Some(b';'));
    }

    #[test]
    fn sniff_ignores_delimiters_inside_quotes() {
        let sample = "a,b\n\"x;y;z\",1\n\"p;q\",2\n";
        assert_eq!(sniff_delimiter(sample), Some(b','));
    }

    #[test]
    fn sniff_handles_tabs_and_pipes() {
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), Some(b'\t'));
        assert_eq!(sniff_delimiter("a|b|c\n1|2|3\r\n"), Some(b'|'));
    }

    #[test]
    fn sniff_gives_up_on_ambiguous_samples() {
        assert_eq!(sniff_delimiter(""), None);
        assert_eq!(sniff_delimiter("single\ncolumn\nvalues\n"), None);
        assert_eq!(sniff_delimiter("a;b\nc,d,e\nf|g\n"), None);
    }

    #[test]
    fn sniff_drops_truncated_final_line() {
        let mut sample = String::from("a;b\n");
        while sample.len() < SNIFF_SAMPLE_BYTES {
            sample.push_str("1;2\n");
        }
        sample.push_str("3;4;5;6");
        assert_eq!(sniff_delimiter(&sample), Some(b';'));
    }

    #[test]
    fn decode_bytes_rejects_invalid_utf8() {
        assert!(decode_bytes(&[0x66, 0xff], UTF_8).is_none());
        let (encoded, _, _) = WINDOWS_1252.encode("café");
        assert_eq!(decode_bytes(&encoded, WINDOWS_1252).as_deref(), Some("café"));
    }

    #[test]
    fn sample_head_follows_byte_order_mark() {
        let mut bytes = vec![0xff, 0xfe];
        for unit in "a;b\n1;2\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let sample = sample_head(&bytes, UTF_8);
        assert_eq!(sample, "a;b\n1;2\n");
        assert_eq!(sniff_delimiter(&sample), Some(b';'));
        assert_eq!(decode_bytes(&bytes, UTF_8).as_deref(), Some("a;b\n1;2\n"));

        let (latin, _, _) = WINDOWS_1252.encode("nom;ville\nRené;Sète\n");
        assert_eq!(sample_head(&latin, WINDOWS_1252), "nom;ville\nRené;Sète\n");
    }

    #[test]
    fn resolve_encoding_defaults_to_utf8() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert!(resolve_encoding(Some("klingon")).is_err());
    }
}
