//! Result state machine
//!
//! - State is an explicit value, replaced wholesale by each transition
//! - Transitions are caller-driven; nothing happens on a timer
//! - A transition whose precondition fails returns `InvalidTransition`
//!   and leaves the current state untouched
//! - `start == current_page * page_size` after every transition
//!
//! Infallible transitions consume the state. Fallible ones borrow it so the
//! caller still holds the old state when they are rejected.

use serde::Serialize;

use crate::multipart::Record;
use crate::transport::StreamIndex;

use super::errors::{ResultError, ResultsResult};
use super::pagination::PaginationWindow;

/// Where the current result lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    #[default]
    Idle,
    /// Fully materialized in memory
    Static,
    /// Read back page by page through a stream index
    Stream,
}

impl ResultMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultMode::Idle => "idle",
            ResultMode::Static => "static",
            ResultMode::Stream => "stream",
        }
    }
}

/// Progress of the current result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    #[default]
    Idle,
    /// Stream index installed, first page not yet applied
    Loading,
    /// A stream page is loaded and more pages follow
    Ready,
    /// The loaded stream page is the final one
    Complete,
    /// The last load or query failed; see `ResultState::error`
    Error,
    /// Static result loaded
    Static,
}

impl StreamStatus {
    /// State name for observability
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Idle => "Idle",
            StreamStatus::Loading => "Loading",
            StreamStatus::Ready => "Ready",
            StreamStatus::Complete => "Complete",
            StreamStatus::Error => "Error",
            StreamStatus::Static => "Static",
        }
    }
}

/// Everything the console knows about the current result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultState {
    mode: ResultMode,
    status: StreamStatus,
    index: Option<StreamIndex>,
    records: Vec<Record>,
    active_record: usize,
    total_records: usize,
    pagination: PaginationWindow,
    error: Option<ResultError>,
}

impl Default for ResultState {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ResultState {
    /// Create an idle state with a fixed page size
    pub fn new(page_size: usize) -> Self {
        Self {
            mode: ResultMode::Idle,
            status: StreamStatus::Idle,
            index: None,
            records: Vec::new(),
            active_record: 0,
            total_records: 0,
            pagination: PaginationWindow::new(page_size),
            error: None,
        }
    }

    pub fn mode(&self) -> ResultMode {
        self.mode
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn index(&self) -> Option<&StreamIndex> {
        self.index.as_ref()
    }

    /// Loaded records: the current page when streaming, everything when static
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn pagination(&self) -> &PaginationWindow {
        &self.pagination
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size()
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages()
    }

    pub fn error(&self) -> Option<&ResultError> {
        self.error.as_ref()
    }

    /// Position of the active record on the visible page
    pub fn active_position(&self) -> usize {
        self.active_record
    }

    /// The highlighted record, if the visible page holds any
    pub fn active_record(&self) -> Option<&Record> {
        self.page_records().get(self.active_record)
    }

    /// Range of `records()` visible on the current page
    pub fn page_bounds(&self) -> (usize, usize) {
        match self.mode {
            ResultMode::Static => {
                let start = self.pagination.start().min(self.records.len());
                let end = (start + self.page_size()).min(self.records.len());
                (start, end)
            }
            _ => (0, self.records.len()),
        }
    }

    /// Records visible on the current page
    pub fn page_records(&self) -> &[Record] {
        let (start, end) = self.page_bounds();
        &self.records[start..end]
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Any -> Idle. The page size survives.
    pub fn reset(self) -> Self {
        Self::new(self.page_size())
    }

    /// Any -> Static
    ///
    /// Records without an absolute index get their position in the set.
    pub fn load_static(self, records: Vec<Record>) -> Self {
        let records: Vec<Record> = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| match r.index {
                Some(_) => r,
                None => r.with_index(i),
            })
            .collect();
        let total = records.len();

        Self {
            mode: ResultMode::Static,
            status: StreamStatus::Static,
            index: None,
            records,
            active_record: 0,
            total_records: total,
            pagination: self.pagination.with_total(total),
            error: None,
        }
    }

    /// Any -> Loading. Page 0 must be loaded next.
    pub fn initialize_stream(self, index: StreamIndex) -> Self {
        let total = index.part_count();
        Self {
            mode: ResultMode::Stream,
            status: StreamStatus::Loading,
            index: Some(index),
            records: Vec::new(),
            active_record: 0,
            total_records: total,
            pagination: self.pagination.with_total(total),
            error: None,
        }
    }

    /// Stream -> Ready | Complete
    ///
    /// Requires a stream index and `page` within the result.
    pub fn set_page(&self, records: Vec<Record>, page: usize) -> ResultsResult<Self> {
        if self.index.is_none() || !self.pagination.contains(page) {
            return Err(ResultError::invalid_transition(
                self.status.as_str(),
                StreamStatus::Ready.as_str(),
            ));
        }

        let pagination = self.pagination.at_page(page);
        let status = if pagination.start() + records.len() >= self.total_records {
            StreamStatus::Complete
        } else {
            StreamStatus::Ready
        };

        Ok(Self {
            mode: ResultMode::Stream,
            status,
            index: self.index.clone(),
            records,
            active_record: 0,
            total_records: self.total_records,
            pagination,
            error: None,
        })
    }

    /// Static -> Static, showing `page` of the in-memory records.
    ///
    /// The first record of the page becomes active.
    pub fn show_static_page(&self, page: usize) -> ResultsResult<Self> {
        if self.mode != ResultMode::Static || !self.pagination.contains(page) {
            return Err(ResultError::invalid_transition(
                self.status.as_str(),
                StreamStatus::Static.as_str(),
            ));
        }

        let pagination = self.pagination.at_page(page);
        Ok(Self {
            active_record: 0,
            pagination,
            ..self.clone()
        })
    }

    /// Any -> Error
    pub fn set_error(self, error: ResultError) -> Self {
        Self {
            status: StreamStatus::Error,
            error: Some(error),
            ..self
        }
    }

    /// Clamp `position` to `[0, page_len - 1]` and make it active.
    ///
    /// Positions are relative to the visible page in both modes, so the
    /// same input selects the same row whether the page was read from disk
    /// or sliced from memory. Returns the state and the stored position.
    pub fn set_active_record(self, position: isize) -> (Self, usize) {
        let page_len = self.page_records().len();
        let clamped = if page_len == 0 || position <= 0 {
            0
        } else {
            (position as usize).min(page_len - 1)
        };

        (
            Self {
                active_record: clamped,
                ..self
            },
            clamped,
        )
    }

    // =========================================================================
    // PAGE TARGETS
    // =========================================================================

    /// Page after the current one, if it holds any record
    pub fn next_page_target(&self) -> Option<usize> {
        if self.mode == ResultMode::Idle {
            return None;
        }
        let target = self.current_page() + 1;
        (target * self.page_size() < self.total_records).then_some(target)
    }

    /// Page before the current one, if any
    pub fn prev_page_target(&self) -> Option<usize> {
        if self.mode == ResultMode::Idle {
            return None;
        }
        self.current_page().checked_sub(1)
    }

    /// `page` clamped into the result, or None while idle
    pub fn jump_target(&self, page: isize) -> Option<usize> {
        if self.mode == ResultMode::Idle {
            return None;
        }
        Some(self.pagination.clamp_page(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<Record> {
        (0..n).map(|i| Record::new(format!("r{}", i))).collect()
    }

    fn page(start: usize, n: usize) -> Vec<Record> {
        (start..start + n)
            .map(|i| Record::new(format!("r{}", i)).with_index(i))
            .collect()
    }

    fn assert_window_consistent(state: &ResultState) {
        let window = state.pagination();
        assert_eq!(
            window.total_pages(),
            state.total_records().div_ceil(window.page_size())
        );
        assert_eq!(window.start(), window.current_page() * window.page_size());
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = ResultState::new(10);
        assert_eq!(state.mode(), ResultMode::Idle);
        assert_eq!(state.status(), StreamStatus::Idle);
        assert!(state.active_record().is_none());
        assert_eq!(state.total_pages(), 0);
    }

    #[test]
    fn test_static_load_scenario() {
        let state = ResultState::new(50).load_static(records(2));
        assert_eq!(state.mode(), ResultMode::Static);
        assert_eq!(state.status(), StreamStatus::Static);
        assert_eq!(state.total_records(), 2);
        assert_eq!(state.total_pages(), 1);
        assert_eq!(state.current_page(), 0);
        assert_eq!(state.active_position(), 0);
        assert_eq!(state.records()[1].index, Some(1));
        assert_window_consistent(&state);
    }

    #[test]
    fn test_static_load_empty() {
        let state = ResultState::new(50).load_static(Vec::new());
        assert_eq!(state.total_pages(), 0);
        assert!(state.page_records().is_empty());
        assert!(state.active_record().is_none());
    }

    #[test]
    fn test_reset_preserves_page_size() {
        let state = ResultState::new(7)
            .load_static(records(20))
            .set_error(ResultError::transport_failure("x"))
            .reset();
        assert_eq!(state, ResultState::new(7));
    }

    #[test]
    fn test_initialize_stream() {
        let state = ResultState::new(1).initialize_stream(StreamIndex::new("/d", 3));
        assert_eq!(state.mode(), ResultMode::Stream);
        assert_eq!(state.status(), StreamStatus::Loading);
        assert_eq!(state.total_records(), 3);
        assert_eq!(state.total_pages(), 3);
        assert!(state.records().is_empty());
        assert_window_consistent(&state);
    }

    #[test]
    fn test_set_page_ready_then_complete() {
        let state = ResultState::new(1).initialize_stream(StreamIndex::new("/d", 3));

        let state = state.set_page(page(0, 1), 0).unwrap();
        assert_eq!(state.status(), StreamStatus::Ready);

        let state = state.set_page(page(2, 1), 2).unwrap();
        assert_eq!(state.status(), StreamStatus::Complete);
        assert_eq!(state.current_page(), 2);
        assert_eq!(state.pagination().start(), 2);
        assert_eq!(state.active_record().unwrap().content, "r2");
        assert_window_consistent(&state);
    }

    #[test]
    fn test_set_page_without_index_rejected() {
        let state = ResultState::new(10).load_static(records(3));
        let err = state.set_page(page(0, 1), 0).unwrap_err();
        assert_eq!(err, ResultError::invalid_transition("Static", "Ready"));
        assert_eq!(state.status(), StreamStatus::Static);
    }

    #[test]
    fn test_set_page_out_of_range_rejected() {
        let state = ResultState::new(1).initialize_stream(StreamIndex::new("/d", 3));
        assert!(state.set_page(page(3, 1), 3).is_err());
        assert_eq!(state.status(), StreamStatus::Loading);
    }

    #[test]
    fn test_set_page_clears_error() {
        let state = ResultState::new(1)
            .initialize_stream(StreamIndex::new("/d", 3))
            .set_error(ResultError::transport_failure("io"));
        assert_eq!(state.status(), StreamStatus::Error);

        let state = state.set_page(page(0, 1), 0).unwrap();
        assert!(state.error().is_none());
    }

    #[test]
    fn test_show_static_page() {
        let state = ResultState::new(10).load_static(records(25));
        let state = state.show_static_page(2).unwrap();
        assert_eq!(state.current_page(), 2);
        assert_eq!(state.page_records().len(), 5);
        assert_eq!(state.active_position(), 0);
        assert_eq!(state.active_record().unwrap().content, "r20");
        assert_window_consistent(&state);

        assert!(state.show_static_page(3).is_err());
    }

    #[test]
    fn test_active_record_clamp() {
        let state = ResultState::new(10).load_static(records(5));
        for (input, expected) in [(-100, 0), (-1, 0), (0, 0), (3, 3), (4, 4), (5, 4), (1000, 4)] {
            let (_, stored) = state.clone().set_active_record(input);
            assert_eq!(stored, expected, "input {}", input);
        }
    }

    #[test]
    fn test_active_record_clamp_within_static_page() {
        let state = ResultState::new(10)
            .load_static(records(25))
            .show_static_page(1)
            .unwrap();
        let (state, stored) = state.set_active_record(-3);
        assert_eq!(stored, 0);
        assert_eq!(state.active_record().unwrap().content, "r10");
        let (state, stored) = state.set_active_record(99);
        assert_eq!(stored, 9);
        assert_eq!(state.active_record().unwrap().content, "r19");
    }

    #[test]
    fn test_active_record_same_row_static_and_stream() {
        let static_state = ResultState::new(10)
            .load_static(records(25))
            .show_static_page(1)
            .unwrap();
        let stream_state = ResultState::new(10)
            .initialize_stream(StreamIndex::new("/d", 25))
            .set_page(page(10, 10), 1)
            .unwrap();

        let (static_state, static_pos) = static_state.set_active_record(3);
        let (stream_state, stream_pos) = stream_state.set_active_record(3);

        assert_eq!(static_pos, 3);
        assert_eq!(stream_pos, 3);
        assert_eq!(static_state.active_record().unwrap().content, "r13");
        assert_eq!(stream_state.active_record().unwrap().content, "r13");
        assert_eq!(
            static_state.active_record().unwrap().index,
            stream_state.active_record().unwrap().index
        );
    }

    #[test]
    fn test_active_record_on_empty_state() {
        let (state, stored) = ResultState::new(10).set_active_record(3);
        assert_eq!(stored, 0);
        assert!(state.active_record().is_none());
    }

    #[test]
    fn test_page_targets() {
        let idle = ResultState::new(1);
        assert_eq!(idle.next_page_target(), None);
        assert_eq!(idle.jump_target(2), None);

        let state = ResultState::new(1).initialize_stream(StreamIndex::new("/d", 3));
        assert_eq!(state.next_page_target(), Some(1));
        assert_eq!(state.prev_page_target(), None);
        assert_eq!(state.jump_target(-5), Some(0));
        assert_eq!(state.jump_target(10), Some(2));

        let last = state.set_page(page(2, 1), 2).unwrap();
        assert_eq!(last.next_page_target(), None);
        assert_eq!(last.prev_page_target(), Some(1));
    }

    #[test]
    fn test_set_error_keeps_records() {
        let state = ResultState::new(10)
            .load_static(records(3))
            .set_error(ResultError::ResultTooLarge { limit_bytes: 8 });
        assert_eq!(state.status(), StreamStatus::Error);
        assert_eq!(state.records().len(), 3);
        assert_eq!(state.error(), Some(&ResultError::ResultTooLarge { limit_bytes: 8 }));
    }
}
