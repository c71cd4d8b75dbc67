//! Head/tail windows and paginated browsing.
//!
//! [`Pagination`] is the whole browsing state machine. Page arithmetic keeps
//! `page <= total_rows / rows_per_page`; `next` only advances while rows
//! remain past the current window and `previous` stops at zero. Leaving
//! paginated mode always resets the page.

use std::ops::Range;

use clap::ValueEnum;
use serde::Serialize;

use crate::{dataset::Dataset, error::Result};

/// Rows shown by the head and tail windows.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PreviewMode {
    #[default]
    Head,
    Tail,
    HeadAndTail,
    Paginated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RowsPerPage {
    #[default]
    #[value(name = "20")]
    Twenty,
    #[value(name = "50")]
    Fifty,
    #[value(name = "100")]
    Hundred,
}

impl RowsPerPage {
    pub fn get(self) -> usize {
        match self {
            RowsPerPage::Twenty => 20,
            RowsPerPage::Fifty => 50,
            RowsPerPage::Hundred => 100,
        }
    }

    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            20 => Some(RowsPerPage::Twenty),
            50 => Some(RowsPerPage::Fifty),
            100 => Some(RowsPerPage::Hundred),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    page: usize,
    rows_per_page: RowsPerPage,
    mode: PreviewMode,
}

impl Pagination {
    pub fn new(mode: PreviewMode, rows_per_page: RowsPerPage) -> Self {
        Self {
            page: 0,
            rows_per_page,
            mode,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn rows_per_page(&self) -> RowsPerPage {
        self.rows_per_page
    }

    pub fn mode(&self) -> PreviewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PreviewMode) {
        self.mode = mode;
        if mode != PreviewMode::Paginated {
            self.page = 0;
        }
    }

    /// Changes the page size, pulling the page back inside the new bounds.
    pub fn set_rows_per_page(&mut self, rows_per_page: RowsPerPage, total_rows: usize) {
        self.rows_per_page = rows_per_page;
        self.page = self.page.min(self.max_page(total_rows));
    }

    pub fn max_page(&self, total_rows: usize) -> usize {
        total_rows / self.rows_per_page.get()
    }

    /// Visible row range for the current page, clamped to the dataset.
    pub fn window(&self, total_rows: usize) -> Range<usize> {
        let (start, end) = self.raw_bounds();
        start.min(total_rows)..end.min(total_rows)
    }

    fn raw_bounds(&self) -> (usize, usize) {
        let start = self.page * self.rows_per_page.get();
        (start, start + self.rows_per_page.get())
    }

    /// Advances one page if rows remain beyond the current window.
    pub fn next(&mut self, total_rows: usize) -> bool {
        if self.mode != PreviewMode::Paginated {
            return false;
        }
        let (_, end) = self.raw_bounds();
        if end < total_rows {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.mode == PreviewMode::Paginated && self.page > 0 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jumps straight to `page`, clamped to the last valid page.
    pub fn go_to(&mut self, page: usize, total_rows: usize) {
        if self.mode == PreviewMode::Paginated {
            self.page = page.min(self.max_page(total_rows));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub data: Dataset,
    pub range: Range<usize>,
    pub total_rows: usize,
    pub page: usize,
    pub max_page: usize,
}

impl PageView {
    pub fn caption(&self) -> String {
        format!(
            "Showing rows {} to {} of {}",
            self.range.start + 1,
            self.range.end,
            self.total_rows
        )
    }

    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page + 1, self.max_page + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Window {
        data: Dataset,
        row_numbers: Vec<usize>,
    },
    Page(PageView),
}

impl Preview {
    pub fn data(&self) -> &Dataset {
        match self {
            Preview::Window { data, .. } => data,
            Preview::Page(view) => &view.data,
        }
    }

    /// Zero-based positions of the shown rows in the source dataset.
    pub fn row_numbers(&self) -> Vec<usize> {
        match self {
            Preview::Window { row_numbers, .. } => row_numbers.clone(),
            Preview::Page(view) => view.range.clone().collect(),
        }
    }
}

/// Renders the current mode over `columns` (all columns when empty).
pub fn preview(dataset: &Dataset, columns: &[String], state: &Pagination) -> Result<Preview> {
    let projected = dataset.select_columns(columns)?;
    let total_rows = projected.row_count();
    let head = 0..PREVIEW_ROWS.min(total_rows);
    let tail = total_rows.saturating_sub(PREVIEW_ROWS)..total_rows;
    let preview = match state.mode() {
        PreviewMode::Head => Preview::Window {
            data: projected.head(PREVIEW_ROWS),
            row_numbers: head.collect(),
        },
        PreviewMode::Tail => Preview::Window {
            data: projected.tail(PREVIEW_ROWS),
            row_numbers: tail.collect(),
        },
        PreviewMode::HeadAndTail => Preview::Window {
            data: projected.head_and_tail(PREVIEW_ROWS),
            row_numbers: head.chain(tail).collect(),
        },
        PreviewMode::Paginated => {
            let range = state.window(total_rows);
            Preview::Page(PageView {
                data: projected.slice(range.clone()),
                range,
                total_rows,
                page: state.page(),
                max_page: state.max_page(total_rows),
            })
        }
    };
    Ok(preview)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginated(rows_per_page: RowsPerPage) -> Pagination {
        Pagination::new(PreviewMode::Paginated, rows_per_page)
    }

    #[test]
    fn pages_cover_105_rows_in_fifties() {
        let mut state = paginated(RowsPerPage::Fifty);
        assert_eq!(state.window(105), 0..50);
        assert!(state.next(105));
        assert_eq!(state.window(105), 50..100);
        assert!(state.next(105));
        assert_eq!(state.window(105), 100..105);
        assert!(!state.next(105));
        assert_eq!(state.page(), 2);
        assert_eq!(state.max_page(105), 2);
    }

    #[test]
    fn previous_stops_at_first_page() {
        let mut state = paginated(RowsPerPage::Twenty);
        assert!(!state.previous());
        state.next(45);
        assert!(state.previous());
        assert_eq!(state.page(), 0);
    }

    #[test]
    fn leaving_paginated_mode_resets_page() {
        let mut state = paginated(RowsPerPage::Twenty);
        state.next(100);
        state.next(100);
        state.set_mode(PreviewMode::Tail);
        assert_eq!(state.page(), 0);
        assert!(!state.next(100));
    }

    #[test]
    fn resizing_pages_clamps_page_index() {
        let mut state = paginated(RowsPerPage::Twenty);
        state.go_to(4, 100);
        assert_eq!(state.page(), 4);
        state.set_rows_per_page(RowsPerPage::Hundred, 100);
        assert_eq!(state.page(), 1);
        state.go_to(99, 100);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn head_and_tail_numbers_rows_from_both_ends() {
        let raw = (0..12).map(|i| vec![i.to_string()]).collect::<Vec<_>>();
        let dataset = Dataset::from_raw(vec!["n".into(), "m".into()], raw);
        let state = Pagination::new(PreviewMode::HeadAndTail, RowsPerPage::Twenty);
        let shown = preview(&dataset, &["n".to_string()], &state).unwrap();
        assert_eq!(shown.row_numbers(), vec![0, 1, 2, 3, 4, 7, 8, 9, 10, 11]);
        assert_eq!(shown.data().column_names(), vec!["n"]);
    }

    #[test]
    fn page_view_captions_match_window() {
        let raw = (0..105).map(|i| vec![i.to_string()]).collect::<Vec<_>>();
        let dataset = Dataset::from_raw(vec!["n".into()], raw);
        let mut state = paginated(RowsPerPage::Fifty);
        state.go_to(2, 105);
        let Preview::Page(view) = preview(&dataset, &[], &state).unwrap() else {
            panic!("expected page view");
        };
        assert_eq!(view.caption(), "Showing rows 101 to 105 of 105");
        assert_eq!(view.page_label(), "Page 3 of 3");
        assert_eq!(view.data.row_count(), 5);
    }

    #[test]
    fn rows_per_page_round_trips_counts() {
        assert_eq!(RowsPerPage::from_count(50), Some(RowsPerPage::Fifty));
        assert_eq!(RowsPerPage::from_count(30), None);
        assert_eq!(RowsPerPage::Hundred.get(), 100);
    }
}
