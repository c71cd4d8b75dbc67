//! Per-session state: the working dataset and the browsing position.
//!
//! Operations receive the session explicitly, so several sessions can live
//! side by side without sharing anything.

use log::{info, warn};

use crate::{
    dataset::Dataset,
    error::{Result, StationError},
    loader::{self, Fetch, LoadOptions, Source},
    preview::{self, Pagination, Preview, PreviewMode, RowsPerPage},
};

#[derive(Debug, Clone, Default)]
pub struct Session {
    working: Option<Dataset>,
    source_label: Option<String>,
    delimiter: Option<u8>,
    pagination: Pagination,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the working dataset. On failure the previous dataset, if
    /// any, stays in place.
    pub fn load(
        &mut self,
        source: &Source,
        options: &LoadOptions,
        fetcher: &dyn Fetch,
    ) -> Result<&Dataset> {
        match loader::load(source, options, fetcher) {
            Ok(loaded) => {
                self.source_label = Some(source.label().to_string());
                self.delimiter = loaded.delimiter;
                self.pagination =
                    Pagination::new(self.pagination.mode(), self.pagination.rows_per_page());
                Ok(self.working.insert(loaded.dataset))
            }
            Err(err) => {
                if self.working.is_some() {
                    warn!("Keeping previous dataset after failed load: {err}");
                }
                Err(err)
            }
        }
    }

    /// The working dataset, or a validation error before the first
    /// successful load.
    pub fn dataset(&self) -> Result<&Dataset> {
        self.working.as_ref().ok_or_else(|| {
            StationError::Validation(
                "No dataset loaded. Upload a file or provide a valid URL to begin.".to_string(),
            )
        })
    }

    pub fn has_dataset(&self) -> bool {
        self.working.is_some()
    }

    pub fn source_label(&self) -> Option<&str> {
        self.source_label.as_deref()
    }

    /// Delimiter the working dataset was parsed with, when it came from text.
    pub fn delimiter(&self) -> Option<u8> {
        self.delimiter
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn set_preview_mode(&mut self, mode: PreviewMode) {
        self.pagination.set_mode(mode);
    }

    pub fn set_rows_per_page(&mut self, rows_per_page: RowsPerPage) -> Result<()> {
        let total = self.dataset()?.row_count();
        self.pagination.set_rows_per_page(rows_per_page, total);
        Ok(())
    }

    pub fn next_page(&mut self) -> Result<bool> {
        let total = self.dataset()?.row_count();
        Ok(self.pagination.next(total))
    }

    pub fn previous_page(&mut self) -> Result<bool> {
        self.dataset()?;
        Ok(self.pagination.previous())
    }

    pub fn go_to_page(&mut self, page: usize) -> Result<()> {
        let total = self.dataset()?.row_count();
        self.pagination.go_to(page, total);
        Ok(())
    }

    pub fn preview(&self, columns: &[String]) -> Result<Preview> {
        let dataset = self.dataset()?;
        let preview = preview::preview(dataset, columns, &self.pagination)?;
        info!(
            "Previewing {} row(s) in {:?} mode",
            preview.data().row_count(),
            self.pagination.mode()
        );
        Ok(preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Offline;

    impl Fetch for Offline {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            Err(StationError::Network(format!("offline: {url}")))
        }
    }

    fn upload(name: &str, text: &str) -> Source {
        Source::Upload {
            file_name: name.to_string(),
            bytes: text.as_bytes().to_vec(),
        }
    }

    #[test]
    fn operations_before_first_load_are_gated() {
        let mut session = Session::new();
        let err = session.dataset().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(session.next_page().is_err());
        assert!(session.preview(&[]).is_err());
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut session = Session::new();
        session
            .load(&upload("a.csv", "x,y\n1,2\n"), &LoadOptions::default(), &Offline)
            .unwrap();
        let err = session
            .load(&upload("a.txt", "x\n1\n"), &LoadOptions::default(), &Offline)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        assert_eq!(session.dataset().unwrap().column_names(), vec!["x", "y"]);
        assert_eq!(session.source_label(), Some("a.csv"));
    }

    #[test]
    fn new_load_resets_page_but_keeps_mode() {
        let mut session = Session::new();
        let rows = (0..60).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let text = format!("n\n{rows}\n");
        session
            .load(&upload("n.csv", &text), &LoadOptions::default(), &Offline)
            .unwrap();
        session.set_preview_mode(PreviewMode::Paginated);
        assert!(session.next_page().unwrap());
        session
            .load(&upload("n.csv", &text), &LoadOptions::default(), &Offline)
            .unwrap();
        assert_eq!(session.pagination().page(), 0);
        assert_eq!(session.pagination().mode(), PreviewMode::Paginated);
    }
}
