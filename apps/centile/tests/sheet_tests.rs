//! Integration tests for the remote sheet sink.
//!
//! Runs a miniature in-process spreadsheet gateway and drives `SheetStore`
//! against it over real HTTP, covering both reconciliation paths: header
//! written to an empty sheet, and a mismatched header row rewritten in place.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use centile::config::SheetConfig;
use centile::sink::SheetStore;
use centile::sink::sheet::RowPayload;
use centile_core::RecordSink;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

// =============================================================================
// MOCK GATEWAY
// =============================================================================

type SheetRows = Arc<Mutex<Vec<Vec<String>>>>;

async fn get_first_row(State(rows): State<SheetRows>) -> Result<Json<RowPayload>, StatusCode> {
    let rows = rows.lock().unwrap();
    match rows.first() {
        Some(first) => Ok(Json(RowPayload {
            values: first.clone(),
        })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn put_first_row(
    State(rows): State<SheetRows>,
    Json(payload): Json<RowPayload>,
) -> StatusCode {
    let mut rows = rows.lock().unwrap();
    if rows.is_empty() {
        rows.push(payload.values);
    } else {
        rows[0] = payload.values;
    }
    StatusCode::OK
}

async fn append_row(State(rows): State<SheetRows>, Json(payload): Json<RowPayload>) -> StatusCode {
    rows.lock().unwrap().push(payload.values);
    StatusCode::CREATED
}

/// Start the mock gateway on an ephemeral port; returns its rows and address.
async fn start_gateway() -> (SheetRows, SocketAddr) {
    let rows: SheetRows = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/documents/study/sheets/responses/rows/1",
            get(get_first_row).put(put_first_row),
        )
        .route("/documents/study/sheets/responses/rows", post(append_row))
        .with_state(rows.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (rows, addr)
}

fn sheet_store(addr: SocketAddr) -> SheetStore {
    SheetStore::new(&SheetConfig {
        endpoint: format!("http://{addr}"),
        document: "study".to_string(),
        worksheet: "responses".to_string(),
        token: None,
    })
}

/// Drive the blocking sink from the async test runtime.
async fn append(
    store: SheetStore,
    header: Vec<String>,
    row: Vec<String>,
) -> (SheetStore, Result<(), centile_core::SurveyError>) {
    tokio::task::spawn_blocking(move || {
        let mut store = store;
        let result = store.append(&header, &row);
        (store, result)
    })
    .await
    .unwrap()
}

fn strings(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|s| (*s).to_string()).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[tokio::test]
async fn empty_sheet_gets_header_then_row() {
    let (rows, addr) = start_gateway().await;
    let store = sheet_store(addr);

    let header = strings(&["participant_id", "q1_stage1"]);
    let row = strings(&["p-1", "42"]);
    let (_store, result) = append(store, header.clone(), row.clone()).await;
    result.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 2, "two writes: header first, then the data row");
    assert_eq!(rows[0], header);
    assert_eq!(rows[1], row);
}

#[tokio::test]
async fn mismatched_header_row_is_rewritten_in_place() {
    let (rows, addr) = start_gateway().await;
    rows.lock().unwrap().push(strings(&["a", "b"]));
    rows.lock().unwrap().push(strings(&["old-1", "old-2"]));

    let store = sheet_store(addr);
    let header = strings(&["participant_id", "q1_stage1", "q1_pred"]);
    let row = strings(&["p-2", "42", "44"]);
    let (_store, result) = append(store, header.clone(), row.clone()).await;
    result.unwrap();

    let rows = rows.lock().unwrap();
    // Row 1 replaced with the canonical header; historical data untouched;
    // the new row appended at the bottom.
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], header);
    assert_eq!(rows[1], strings(&["old-1", "old-2"]));
    assert_eq!(rows[2], row);
}

#[tokio::test]
async fn matching_header_appends_only() {
    let (rows, addr) = start_gateway().await;
    let header = strings(&["participant_id", "q1_stage1"]);
    rows.lock().unwrap().push(header.clone());

    let store = sheet_store(addr);
    let (store, result) = append(store, header.clone(), strings(&["p-3", "7"])).await;
    result.unwrap();
    let (_store, result) = append(store, header.clone(), strings(&["p-4", "9"])).await;
    result.unwrap();

    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], header);
}

#[tokio::test]
async fn unreachable_gateway_is_a_retryable_error() {
    // Nothing listens on this port (bound then dropped).
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = sheet_store(addr);
    let (_store, result) = append(store, strings(&["a"]), strings(&["1"])).await;
    let err = result.unwrap_err();
    assert!(err.is_retryable());
}
