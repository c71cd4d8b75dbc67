//! Error types surfaced by the station's operations.
//!
//! Every operation reports failures through [`StationError`]. The shell turns
//! them into user-visible messages; none of them invalidate the working
//! dataset held by a [`crate::session::Session`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StationError>;

/// Coarse classification used when reporting an error to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Load,
    Validation,
    Configuration,
    Export,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StationError {
    /// The source could not be read or parsed.
    #[error("failed to load data: {0}")]
    Load(String),

    /// The file extension or URL shape is not one the loader understands.
    #[error("unsupported format: {0} (only CSV, Excel, or Google Sheets are allowed)")]
    UnsupportedFormat(String),

    /// Fetching a remote source failed.
    #[error("network error: {0}")]
    Network(String),

    /// An operation was requested against missing data or unknown columns.
    #[error("{0}")]
    Validation(String),

    /// User-supplied settings, such as a mapping table, are incomplete.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Serializing a dataset for download failed.
    #[error("export failed: {0}")]
    Export(String),
}

impl StationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StationError::Load(_) | StationError::UnsupportedFormat(_) | StationError::Network(_) => {
                ErrorKind::Load
            }
            StationError::Validation(_) => ErrorKind::Validation,
            StationError::Configuration(_) => ErrorKind::Configuration,
            StationError::Export(_) => ErrorKind::Export,
        }
    }

    pub(crate) fn unknown_column(name: &str) -> Self {
        StationError::Validation(format!("Column '{name}' not found in dataset"))
    }
}

impl From<csv::Error> for StationError {
    fn from(err: csv::Error) -> Self {
        StationError::Load(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_groups_source_failures_as_load_errors() {
        assert_eq!(StationError::Network("timeout".into()).kind(), ErrorKind::Load);
        assert_eq!(
            StationError::UnsupportedFormat("notes.txt".into()).kind(),
            ErrorKind::Load
        );
        assert_eq!(
            StationError::Configuration("missing value".into()).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn unknown_column_is_a_validation_error() {
        let err = StationError::unknown_column("price");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Column 'price' not found in dataset");
    }
}
