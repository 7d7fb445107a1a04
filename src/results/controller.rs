//! Results controller
//!
//! Owns the single `ResultState` and composes its transitions with page
//! reads.
//!
//! - The state lock is never held across an await
//! - Every reset, static load, stream initialization and page load takes a
//!   new generation; a page read finishing under an older generation is
//!   dropped instead of applied
//! - Every query execution takes a ticket; results arriving for a ticket
//!   superseded by a newer query or a reset are dropped
//! - Transport failures become `set_error` transitions; callers never see
//!   a raw transport error
//! - No retries

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::multipart::Record;
use crate::observability::{log_event_with_fields, Event};
use crate::transport::{PartReader, StreamIndex};

use super::errors::ResultError;
use super::reader::load_page;
use super::state::{ResultMode, ResultState};

/// Identifies one query execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

impl QueryTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Serializes result transitions and drives page loads
pub struct ResultsController {
    reader: Arc<dyn PartReader>,
    state: Mutex<ResultState>,
    generation: AtomicU64,
    query_epoch: AtomicU64,
}

impl ResultsController {
    /// Create an idle controller reading streamed pages through `reader`
    pub fn new(reader: Arc<dyn PartReader>, page_size: usize) -> Self {
        Self {
            reader,
            state: Mutex::new(ResultState::new(page_size)),
            generation: AtomicU64::new(0),
            query_epoch: AtomicU64::new(0),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ResultState {
        self.state.lock().unwrap().clone()
    }

    /// Current load generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Back to idle. Pending page reads and in-flight queries are dropped.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        self.bump_generation();
        self.query_epoch.fetch_add(1, Ordering::SeqCst);
        *state = std::mem::take(&mut *state).reset();
        log_event_with_fields(Event::ResultsReset, &[]);
    }

    /// Start a query execution. Earlier tickets become stale.
    pub fn begin_query(&self) -> QueryTicket {
        let _state = self.state.lock().unwrap();
        QueryTicket(self.query_epoch.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns true if no newer query or reset followed `ticket`
    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.query_epoch.load(Ordering::SeqCst) == ticket.0
    }

    /// Replace the result with fully materialized records
    pub fn load_static(&self, records: Vec<Record>) {
        let state = self.state.lock().unwrap();
        self.apply_static(state, records);
    }

    /// `load_static` on behalf of a query; returns false and leaves the
    /// state alone if the ticket is stale
    pub fn load_static_for(&self, ticket: QueryTicket, records: Vec<Record>) -> bool {
        let state = self.state.lock().unwrap();
        if !self.is_current(ticket) {
            return false;
        }
        self.apply_static(state, records);
        true
    }

    fn apply_static(&self, mut state: MutexGuard<'_, ResultState>, records: Vec<Record>) {
        let count = records.len().to_string();
        self.bump_generation();
        *state = std::mem::take(&mut *state).load_static(records);
        log_event_with_fields(Event::StaticLoaded, &[("records", count.as_str())]);
    }

    /// Record a failure without touching the loaded records
    pub fn set_error(&self, error: ResultError) {
        let mut state = self.state.lock().unwrap();
        *state = std::mem::take(&mut *state).set_error(error);
    }

    /// `set_error` on behalf of a query; ignored if the ticket is stale
    pub fn set_error_for(&self, ticket: QueryTicket, error: ResultError) -> bool {
        let mut state = self.state.lock().unwrap();
        if !self.is_current(ticket) {
            return false;
        }
        *state = std::mem::take(&mut *state).set_error(error);
        true
    }

    /// Select a record on the visible page; returns the clamped position
    pub fn set_active_record(&self, position: isize) -> usize {
        let mut state = self.state.lock().unwrap();
        let (next, stored) = std::mem::take(&mut *state).set_active_record(position);
        *state = next;
        stored
    }

    pub fn go_to_next_record(&self) -> usize {
        self.move_active_record(1)
    }

    pub fn go_to_prev_record(&self) -> usize {
        self.move_active_record(-1)
    }

    fn move_active_record(&self, delta: isize) -> usize {
        let mut state = self.state.lock().unwrap();
        let target = state.active_position() as isize + delta;
        let (next, stored) = std::mem::take(&mut *state).set_active_record(target);
        *state = next;
        stored
    }

    /// Install a stream index and load its first page.
    ///
    /// Returns the page shown afterwards.
    pub async fn initialize_stream(&self, index: StreamIndex) -> usize {
        {
            let state = self.state.lock().unwrap();
            self.apply_stream(state, index);
        }
        self.show_page(0).await
    }

    /// `initialize_stream` on behalf of a query.
    ///
    /// Returns None and leaves the state alone if the ticket is stale.
    pub async fn initialize_stream_for(
        &self,
        ticket: QueryTicket,
        index: StreamIndex,
    ) -> Option<usize> {
        {
            let state = self.state.lock().unwrap();
            if !self.is_current(ticket) {
                return None;
            }
            self.apply_stream(state, index);
        }
        Some(self.show_page(0).await)
    }

    fn apply_stream(&self, mut state: MutexGuard<'_, ResultState>, index: StreamIndex) {
        let parts = index.part_count().to_string();
        self.bump_generation();
        *state = std::mem::take(&mut *state).initialize_stream(index);
        log_event_with_fields(Event::StreamInitialized, &[("parts", parts.as_str())]);
    }

    /// Advance one page. At the last page this is a no-op returning the
    /// current page.
    pub async fn next_page(&self) -> usize {
        let target = self.state.lock().unwrap().next_page_target();
        match target {
            Some(page) => self.show_page(page).await,
            None => self.current_page(),
        }
    }

    /// Go back one page, stopping at page 0
    pub async fn prev_page(&self) -> usize {
        let target = self.state.lock().unwrap().prev_page_target();
        match target {
            Some(page) => self.show_page(page).await,
            None => self.current_page(),
        }
    }

    /// Show `page`, clamped into the result
    pub async fn jump_to_page(&self, page: isize) -> usize {
        let target = self.state.lock().unwrap().jump_target(page);
        match target {
            Some(page) => self.show_page(page).await,
            None => self.current_page(),
        }
    }

    fn current_page(&self) -> usize {
        self.state.lock().unwrap().current_page()
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Static results move the window in memory; streamed results read the
    /// page through the part reader.
    async fn show_page(&self, page: usize) -> usize {
        let (index, page_size, generation) = {
            let mut state = self.state.lock().unwrap();
            match state.mode() {
                ResultMode::Static => {
                    match state.show_static_page(page) {
                        Ok(next) => *state = next,
                        Err(e) => reject(&e),
                    }
                    return state.current_page();
                }
                ResultMode::Idle => return state.current_page(),
                ResultMode::Stream => {}
            }
            let Some(index) = state.index().cloned() else {
                return state.current_page();
            };
            (index, state.page_size(), self.bump_generation())
        };

        let loaded = load_page(self.reader.as_ref(), &index, page, page_size).await;

        let mut state = self.state.lock().unwrap();
        let page_str = page.to_string();
        if self.generation.load(Ordering::SeqCst) != generation {
            let generation = generation.to_string();
            log_event_with_fields(
                Event::PageStale,
                &[("generation", generation.as_str()), ("page", page_str.as_str())],
            );
            return state.current_page();
        }

        match loaded {
            Ok(records) => {
                let count = records.len().to_string();
                match state.set_page(records, page) {
                    Ok(next) => {
                        *state = next;
                        log_event_with_fields(
                            Event::PageLoaded,
                            &[("page", page_str.as_str()), ("records", count.as_str())],
                        );
                    }
                    Err(e) => reject(&e),
                }
            }
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::PageFailed,
                    &[("page", page_str.as_str()), ("reason", reason.as_str())],
                );
                *state = std::mem::take(&mut *state).set_error(e.into());
            }
        }
        state.current_page()
    }
}

fn reject(error: &ResultError) {
    let reason = error.to_string();
    log_event_with_fields(Event::TransitionRejected, &[("reason", reason.as_str())]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::StreamStatus;
    use crate::transport::{TransportError, TransportFuture};
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Notify;

    /// Generated parts; fails while `fail` is set
    struct FakeParts {
        total: usize,
        fail: AtomicBool,
    }

    impl FakeParts {
        fn new(total: usize) -> Arc<Self> {
            Arc::new(Self {
                total,
                fail: AtomicBool::new(false),
            })
        }
    }

    impl PartReader for FakeParts {
        fn read_parts<'a>(
            &'a self,
            _directory: &'a str,
            start: usize,
            limit: usize,
        ) -> TransportFuture<'a, Vec<Record>> {
            Box::pin(async move {
                if self.fail.load(Ordering::SeqCst) {
                    return Err(TransportError::IoError("disk gone".into()));
                }
                let end = (start + limit).min(self.total);
                Ok((start..end).map(|i| Record::new(format!("p{}", i))).collect())
            })
        }
    }

    /// Blocks every read until released
    struct GatedParts {
        started: Notify,
        release: Notify,
    }

    impl PartReader for GatedParts {
        fn read_parts<'a>(
            &'a self,
            _directory: &'a str,
            start: usize,
            _limit: usize,
        ) -> TransportFuture<'a, Vec<Record>> {
            Box::pin(async move {
                self.started.notify_one();
                self.release.notified().await;
                Ok(vec![Record::new(format!("late {}", start))])
            })
        }
    }

    #[tokio::test]
    async fn test_streaming_pagination_scenario() {
        let controller = ResultsController::new(FakeParts::new(3), 1);

        assert_eq!(controller.initialize_stream(StreamIndex::new("d", 3)).await, 0);
        let state = controller.snapshot();
        assert_eq!(state.status(), StreamStatus::Ready);
        assert_eq!(state.records()[0].index, Some(0));
        assert_eq!(state.total_pages(), 3);

        assert_eq!(controller.next_page().await, 1);
        assert_eq!(controller.snapshot().records()[0].content, "p1");

        assert_eq!(controller.next_page().await, 2);
        assert_eq!(controller.snapshot().status(), StreamStatus::Complete);

        assert_eq!(controller.next_page().await, 2);
        assert_eq!(controller.snapshot().records()[0].index, Some(2));

        assert_eq!(controller.prev_page().await, 1);
        assert_eq!(controller.prev_page().await, 0);
        assert_eq!(controller.prev_page().await, 0);
    }

    #[tokio::test]
    async fn test_jump_clamps() {
        let controller = ResultsController::new(FakeParts::new(25), 10);
        controller.initialize_stream(StreamIndex::new("d", 25)).await;

        assert_eq!(controller.jump_to_page(99).await, 2);
        assert_eq!(controller.snapshot().records().len(), 5);
        assert_eq!(controller.jump_to_page(-3).await, 0);
        assert_eq!(controller.snapshot().pagination().start(), 0);
    }

    #[tokio::test]
    async fn test_page_failure_recorded_in_state() {
        let parts = FakeParts::new(3);
        let controller = ResultsController::new(parts.clone(), 1);
        controller.initialize_stream(StreamIndex::new("d", 3)).await;

        parts.fail.store(true, Ordering::SeqCst);
        assert_eq!(controller.next_page().await, 0);

        let state = controller.snapshot();
        assert_eq!(state.status(), StreamStatus::Error);
        assert_eq!(
            state.error(),
            Some(&ResultError::transport_failure("I/O error: disk gone"))
        );
        assert_eq!(state.records()[0].content, "p0");

        parts.fail.store(false, Ordering::SeqCst);
        assert_eq!(controller.next_page().await, 1);
        assert_eq!(controller.snapshot().status(), StreamStatus::Ready);
    }

    #[tokio::test]
    async fn test_static_paging_without_io() {
        let parts = FakeParts::new(0);
        parts.fail.store(true, Ordering::SeqCst);
        let controller = ResultsController::new(parts, 10);
        controller.load_static((0..25).map(|i| Record::new(format!("s{}", i))).collect());

        assert_eq!(controller.next_page().await, 1);
        assert_eq!(controller.next_page().await, 2);
        assert_eq!(controller.next_page().await, 2);

        let state = controller.snapshot();
        assert_eq!(state.status(), StreamStatus::Static);
        assert_eq!(state.page_records().len(), 5);
        assert_eq!(state.active_record().unwrap().content, "s20");
    }

    #[tokio::test]
    async fn test_record_navigation() {
        let controller = ResultsController::new(FakeParts::new(3), 50);
        controller.initialize_stream(StreamIndex::new("d", 3)).await;

        assert_eq!(controller.go_to_prev_record(), 0);
        assert_eq!(controller.go_to_next_record(), 1);
        assert_eq!(controller.go_to_next_record(), 2);
        assert_eq!(controller.go_to_next_record(), 2);
        assert_eq!(controller.set_active_record(-4), 0);
    }

    #[tokio::test]
    async fn test_idle_paging_is_noop() {
        let controller = ResultsController::new(FakeParts::new(3), 1);
        assert_eq!(controller.next_page().await, 0);
        assert_eq!(controller.jump_to_page(2).await, 0);
        assert_eq!(controller.snapshot(), ResultState::new(1));
    }

    #[tokio::test]
    async fn test_generation_increases() {
        let controller = ResultsController::new(FakeParts::new(3), 1);
        let before = controller.generation();
        controller.reset();
        controller.load_static(vec![Record::new("x")]);
        assert_eq!(controller.generation(), before + 2);
    }

    #[tokio::test]
    async fn test_stale_page_discarded_after_reset() {
        let parts = Arc::new(GatedParts {
            started: Notify::new(),
            release: Notify::new(),
        });
        let controller = Arc::new(ResultsController::new(parts.clone(), 1));

        let loading = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.initialize_stream(StreamIndex::new("d", 3)).await })
        };

        parts.started.notified().await;
        controller.reset();
        parts.release.notify_one();

        assert_eq!(loading.await.unwrap(), 0);
        let state = controller.snapshot();
        assert_eq!(state.mode(), ResultMode::Idle);
        assert!(state.records().is_empty());
    }

    #[tokio::test]
    async fn test_stale_page_discarded_after_newer_stream() {
        let parts = Arc::new(GatedParts {
            started: Notify::new(),
            release: Notify::new(),
        });
        let controller = Arc::new(ResultsController::new(parts.clone(), 1));

        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.initialize_stream(StreamIndex::new("old", 3)).await })
        };
        parts.started.notified().await;

        controller.load_static(vec![Record::new("fresh")]);
        parts.release.notify_one();
        first.await.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.mode(), ResultMode::Static);
        assert_eq!(state.records()[0].content, "fresh");
    }

    #[tokio::test]
    async fn test_query_ticket_superseded() {
        let controller = ResultsController::new(FakeParts::new(3), 1);

        let first = controller.begin_query();
        let second = controller.begin_query();
        assert!(!controller.is_current(first));
        assert!(controller.is_current(second));

        assert!(controller.load_static_for(second, vec![Record::new("b")]));
        assert!(!controller.load_static_for(first, vec![Record::new("a")]));
        assert!(!controller.set_error_for(first, ResultError::transport_failure("late")));
        assert_eq!(
            controller
                .initialize_stream_for(first, StreamIndex::new("d", 3))
                .await,
            None
        );

        let state = controller.snapshot();
        assert_eq!(state.mode(), ResultMode::Static);
        assert_eq!(state.records()[0].content, "b");
        assert_eq!(state.error(), None);
    }

    #[tokio::test]
    async fn test_reset_supersedes_query() {
        let controller = ResultsController::new(FakeParts::new(3), 1);
        let ticket = controller.begin_query();
        controller.reset();

        assert!(!controller.is_current(ticket));
        assert!(!controller.load_static_for(ticket, vec![Record::new("a")]));
        assert_eq!(controller.snapshot().mode(), ResultMode::Idle);
    }

    #[tokio::test]
    async fn test_active_record_is_page_relative_in_both_modes() {
        let records = || (0..25).map(|i| Record::new(format!("p{}", i))).collect();

        let stat = ResultsController::new(FakeParts::new(0), 10);
        stat.load_static(records());
        assert_eq!(stat.next_page().await, 1);

        let stream = ResultsController::new(FakeParts::new(25), 10);
        stream.initialize_stream(StreamIndex::new("d", 25)).await;
        assert_eq!(stream.next_page().await, 1);

        assert_eq!(stat.set_active_record(3), 3);
        assert_eq!(stream.set_active_record(3), 3);
        assert_eq!(stat.snapshot().active_record().unwrap().content, "p13");
        assert_eq!(stream.snapshot().active_record().unwrap().content, "p13");

        assert_eq!(stat.set_active_record(99), 9);
        assert_eq!(stream.set_active_record(99), 9);
        assert_eq!(stat.go_to_next_record(), 9);
        assert_eq!(stream.snapshot().active_record().unwrap().content, "p19");
    }
}
