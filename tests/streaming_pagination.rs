//! Streaming Pagination Tests
//!
//! Spool a large response to disk, then page through it with the results
//! controller reading part files back.
//!
//! - total_pages == ceil(total / page_size)
//! - start == current_page * page_size after every transition
//! - Page boundaries are no-ops
//! - Records carry absolute indices

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use docquery::multipart::{parse, Record};
use docquery::results::{ResultMode, ResultState, ResultsController, StreamStatus};
use docquery::transport::{
    DirectoryPartStore, PartReader, QueryResponse, ResponseSpooler, SpoolMode, StreamIndex,
};
use tempfile::TempDir;
use uuid::Uuid;

// =============================================================================
// Test Utilities
// =============================================================================

fn response_body(parts: usize) -> String {
    let mut body = String::new();
    for i in 0..parts {
        body.push_str(&format!(
            "--R\nContent-Type: application/xml\nX-Primitive: element\nX-URI: /doc/{}.xml\n\n<doc n=\"{}\"/>\n",
            i, i
        ));
    }
    body.push_str("--R--\n");
    body
}

async fn spool(temp: &TempDir, body: &str) -> StreamIndex {
    let spooler = ResponseSpooler::new(temp.path(), 64);
    let response = spooler
        .spool(
            Uuid::new_v4(),
            body.as_bytes(),
            SpoolMode::PreferStream,
            &AtomicBool::new(false),
        )
        .await
        .unwrap();
    match response {
        QueryResponse::Stream(index) => index,
        other => panic!("expected stream, got {:?}", other),
    }
}

fn controller(page_size: usize) -> ResultsController {
    ResultsController::new(Arc::new(DirectoryPartStore::new()), page_size)
}

fn assert_window(state: &ResultState) {
    let window = state.pagination();
    assert_eq!(
        window.total_pages(),
        state.total_records().div_ceil(window.page_size())
    );
    assert_eq!(window.start(), window.current_page() * window.page_size());
}

// =============================================================================
// Spool Layout
// =============================================================================

#[tokio::test]
async fn test_spooled_parts_match_parser() {
    let temp = TempDir::new().unwrap();
    let body = response_body(40);
    let index = spool(&temp, &body).await;
    assert_eq!(index.part_count(), 40);

    let parts = DirectoryPartStore::new()
        .read_parts(index.directory(), 0, 40)
        .await
        .unwrap();
    assert_eq!(parts, parse(&body));
}

#[tokio::test]
async fn test_window_past_end_truncated() {
    let temp = TempDir::new().unwrap();
    let index = spool(&temp, &response_body(5)).await;

    let parts = DirectoryPartStore::new()
        .read_parts(index.directory(), 3, 10)
        .await
        .unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].uri.as_deref(), Some("/doc/3.xml"));
}

// =============================================================================
// Paging
// =============================================================================

#[tokio::test]
async fn test_one_record_per_page_scenario() {
    let temp = TempDir::new().unwrap();
    let index = spool(&temp, &response_body(3)).await;
    let controller = controller(1);

    assert_eq!(controller.initialize_stream(index).await, 0);
    assert_eq!(controller.snapshot().total_pages(), 3);

    for expected in [1, 2, 2] {
        assert_eq!(controller.next_page().await, expected);
        let state = controller.snapshot();
        assert_eq!(state.records().len(), 1);
        assert_eq!(state.records()[0].index, Some(expected));
        assert_window(&state);
    }
    assert_eq!(controller.snapshot().status(), StreamStatus::Complete);

    for expected in [1, 0, 0] {
        assert_eq!(controller.prev_page().await, expected);
        assert_window(&controller.snapshot());
    }
}

#[tokio::test]
async fn test_at_most_one_page_in_memory() {
    let temp = TempDir::new().unwrap();
    let index = spool(&temp, &response_body(95)).await;
    let controller = controller(10);

    controller.initialize_stream(index).await;
    for _ in 0..12 {
        controller.next_page().await;
        let state = controller.snapshot();
        assert!(state.records().len() <= 10);
        assert_window(&state);
    }

    let state = controller.snapshot();
    assert_eq!(state.current_page(), 9);
    assert_eq!(state.records().len(), 5);
    assert_eq!(state.records()[0].index, Some(90));
}

#[tokio::test]
async fn test_jump_and_select() {
    let temp = TempDir::new().unwrap();
    let index = spool(&temp, &response_body(25)).await;
    let controller = controller(10);
    controller.initialize_stream(index).await;

    assert_eq!(controller.jump_to_page(1).await, 1);
    assert_eq!(controller.set_active_record(7), 7);
    assert_eq!(
        controller.snapshot().active_record().unwrap().uri.as_deref(),
        Some("/doc/17.xml")
    );

    assert_eq!(controller.jump_to_page(1000).await, 2);
    assert_eq!(controller.snapshot().active_position(), 0);
    assert_eq!(controller.set_active_record(1000), 4);
}

#[tokio::test]
async fn test_deleted_directory_records_error() {
    let temp = TempDir::new().unwrap();
    let index = spool(&temp, &response_body(20)).await;
    let directory = index.directory().to_string();
    let controller = controller(10);
    controller.initialize_stream(index).await;

    std::fs::remove_dir_all(&directory).unwrap();
    assert_eq!(controller.next_page().await, 0);

    let state = controller.snapshot();
    assert_eq!(state.status(), StreamStatus::Error);
    assert_eq!(state.error().unwrap().code(), "DOCQ_TRANSPORT_FAILURE");
    assert_eq!(state.records().len(), 10);
}

// =============================================================================
// Static Results
// =============================================================================

#[tokio::test]
async fn test_static_load_scenario() {
    let controller = controller(50);
    controller.load_static(vec![Record::new("a"), Record::new("b")]);

    let state = controller.snapshot();
    assert_eq!(state.mode(), ResultMode::Static);
    assert_eq!(state.status(), StreamStatus::Static);
    assert_eq!(state.total_records(), 2);
    assert_eq!(state.total_pages(), 1);
    assert_eq!(state.current_page(), 0);
    assert_eq!(state.active_position(), 0);

    assert_eq!(controller.next_page().await, 0);
    assert_eq!(controller.prev_page().await, 0);
}

#[tokio::test]
async fn test_select_same_row_static_and_streamed() {
    let temp = TempDir::new().unwrap();
    let body = response_body(25);

    let streamed = controller(10);
    streamed.initialize_stream(spool(&temp, &body).await).await;
    let buffered = controller(10);
    buffered.load_static(parse(&body));

    for results in [&streamed, &buffered] {
        assert_eq!(results.jump_to_page(1).await, 1);
        assert_eq!(results.set_active_record(7), 7);
        assert_eq!(
            results.snapshot().active_record().unwrap().uri.as_deref(),
            Some("/doc/17.xml")
        );
        assert_eq!(results.set_active_record(-1), 0);
        assert_eq!(results.go_to_prev_record(), 0);
    }
}

#[tokio::test]
async fn test_reset_returns_to_idle() {
    let controller = controller(50);
    controller.load_static(vec![Record::new("a")]);
    controller.reset();
    assert_eq!(controller.snapshot(), ResultState::new(50));
}
