//! `FirestoreTicketStore` against a mocked Firestore REST endpoint
//!
//! Covers document decoding, the conditional status write and the mapping of
//! Firestore errors onto lookup verdicts and update outcomes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use ticket_scan::lookup::{LOOKUP_FAILED, StatusUpdateOutcome, TICKET_NOT_FOUND};
use ticket_scan::scan::ScanResult;
use ticket_scan::{
    BarcodeFormat, EventId, EventScope, FirestoreTicketStore, LookupVerdict, OrganiserId,
    ScanAction, ScanEnvironment, ScanStore, TicketId, TicketLookupClient, TicketStatus,
    TicketStore, TicketStoreError,
};
use ticket_scan_firestore::FirestoreClient;
use ticket_scan_testing::test_clock;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Fixtures
// ============================================================================

const DOCUMENTS: &str = "/projects/demo/databases/(default)/documents";
const UPDATE_TIME: &str = "2025-03-01T18:30:00.123456Z";

fn scope() -> EventScope {
    EventScope::new(OrganiserId::new("org-1"), EventId::new("evt-1"))
}

fn store(server: &MockServer) -> FirestoreTicketStore {
    FirestoreTicketStore::new(FirestoreClient::new("demo").with_base_url(server.uri()))
}

fn query_path() -> String {
    format!("{DOCUMENTS}/organiser/org-1/events/evt-1:runQuery")
}

fn ticket_path(id: &str) -> String {
    format!("{DOCUMENTS}/organiser/org-1/events/evt-1/tickets/{id}")
}

fn ticket_row(id: &str, status: &str) -> serde_json::Value {
    json!({
        "document": {
            "name": format!("projects/demo/databases/(default)/documents/organiser/org-1/events/evt-1/tickets/{id}"),
            "fields": {
                "ticketBarcode": {"stringValue": "ABC123"},
                "status": {"stringValue": status},
                "ownedBy": {"stringValue": "Alice"},
                "type": {"stringValue": "VIP"},
                "price": {"integerValue": "20"},
                "ticketNumber": {"stringValue": "A-17"}
            },
            "createTime": "2025-03-01T12:00:00Z",
            "updateTime": UPDATE_TIME
        },
        "readTime": "2025-03-01T18:31:00Z"
    })
}

async fn mount_query(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(query_path()))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{"collectionId": "tickets"}],
                "where": {"fieldFilter": {
                    "field": {"fieldPath": "ticketBarcode"},
                    "op": "EQUAL"
                }}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

fn scanned_document() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(ticket_row("t1", "scanned")["document"].clone())
}

fn rpc_error(code: u16, status: &str) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_json(json!({
        "error": {"code": code, "message": "request rejected", "status": status}
    }))
}

// ============================================================================
// Lookup
// ============================================================================

#[tokio::test]
async fn test_lookup_decodes_ticket_and_revision() {
    let server = MockServer::start().await;
    mount_query(&server, json!([ticket_row("t1", "sold")])).await;

    let found = store(&server)
        .find_by_barcode(&scope(), "ABC123")
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, TicketId::new("t1"));
    assert_eq!(found[0].ticket.status, TicketStatus::Sold);
    assert_eq!(found[0].ticket.owned_by, Some(json!("Alice")));
    assert_eq!(found[0].ticket.ticket_type, Some(json!("VIP")));
    assert_eq!(found[0].ticket.price, Some(json!(20)));
    assert_eq!(found[0].ticket.ticket_number, Some(json!("A-17")));
    let updated = Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap()
        + chrono::Duration::microseconds(123_456);
    assert_eq!(found[0].revision, Some(updated));
}

#[tokio::test]
async fn test_lookup_with_no_rows_is_not_found() {
    let server = MockServer::start().await;
    mount_query(&server, json!([{"readTime": "2025-03-01T18:31:00Z"}])).await;

    let client = TicketLookupClient::new(store(&server));

    assert_eq!(
        client.lookup(&scope(), "ZZZ999").await,
        LookupVerdict::invalid(TICKET_NOT_FOUND)
    );
}

#[tokio::test]
async fn test_lookup_server_error_is_lookup_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(query_path()))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = store(&server)
        .find_by_barcode(&scope(), "ABC123")
        .await
        .unwrap_err();
    assert!(matches!(err, TicketStoreError::Unavailable(_)));

    let client = TicketLookupClient::new(store(&server));
    assert_eq!(
        client.lookup(&scope(), "ABC123").await,
        LookupVerdict::invalid(LOOKUP_FAILED)
    );
}

#[tokio::test]
async fn test_malformed_document_is_decode_error() {
    let server = MockServer::start().await;
    mount_query(
        &server,
        json!([{
            "document": {
                "name": "projects/demo/databases/(default)/documents/organiser/org-1/events/evt-1/tickets/bad",
                "fields": {"ticketBarcode": {"stringValue": "ABC123"}}
            }
        }]),
    )
    .await;

    let err = store(&server)
        .find_by_barcode(&scope(), "ABC123")
        .await
        .unwrap_err();

    assert!(matches!(err, TicketStoreError::Decode { ticket_id, .. } if ticket_id == "bad"));
}

#[tokio::test]
async fn test_malformed_duplicate_does_not_hide_valid_match() {
    let server = MockServer::start().await;
    mount_query(
        &server,
        json!([
            {
                "document": {
                    "name": "projects/demo/databases/(default)/documents/organiser/org-1/events/evt-1/tickets/bad",
                    "fields": {"ticketBarcode": {"stringValue": "ABC123"}}
                }
            },
            ticket_row("t1", "sold")
        ]),
    )
    .await;

    let client = TicketLookupClient::new(store(&server));
    let verdict = client.lookup(&scope(), "ABC123").await;

    assert!(matches!(
        verdict,
        LookupVerdict::Valid { ticket_id, .. } if ticket_id == TicketId::new("t1")
    ));
}

#[tokio::test]
async fn test_numeric_ticket_type_is_valid() {
    let server = MockServer::start().await;
    let mut row = ticket_row("t1", "sold");
    row["document"]["fields"]["type"] = json!({"integerValue": "2"});
    mount_query(&server, json!([row])).await;

    let client = TicketLookupClient::new(store(&server));
    let verdict = client.lookup(&scope(), "ABC123").await;

    let LookupVerdict::Valid { ticket, .. } = verdict else {
        panic!("expected a match, got {verdict:?}");
    };
    assert_eq!(ticket.ticket_type, Some(json!(2)));
}

// ============================================================================
// Status update
// ============================================================================

#[tokio::test]
async fn test_set_status_is_conditional_on_revision() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(ticket_path("t1")))
        .and(query_param("updateMask.fieldPaths", "status"))
        .and(query_param(
            "currentDocument.updateTime",
            "2025-03-01T18:30:00.123456000Z",
        ))
        .and(body_partial_json(json!({
            "fields": {"status": {"stringValue": "scanned"}}
        })))
        .respond_with(scanned_document())
        .expect(1)
        .mount(&server)
        .await;

    let revision = UPDATE_TIME.parse().unwrap();
    store(&server)
        .set_status(&scope(), &TicketId::new("t1"), TicketStatus::Scanned, Some(revision))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_status_without_revision_requires_existing_document() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(ticket_path("t1")))
        .and(query_param("currentDocument.exists", "true"))
        .respond_with(rpc_error(404, "NOT_FOUND"))
        .expect(1)
        .mount(&server)
        .await;

    let err = store(&server)
        .set_status(&scope(), &TicketId::new("t1"), TicketStatus::Scanned, None)
        .await
        .unwrap_err();

    assert!(matches!(err, TicketStoreError::NotFound(id) if id == "t1"));
}

#[tokio::test]
async fn test_stale_revision_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(ticket_path("t1")))
        .respond_with(rpc_error(400, "FAILED_PRECONDITION"))
        .mount(&server)
        .await;

    let client = TicketLookupClient::new(store(&server));
    let outcome = client
        .update_status(&scope(), &TicketId::new("t1"), Some(UPDATE_TIME.parse().unwrap()))
        .await;

    assert_eq!(outcome, StatusUpdateOutcome::Conflict);
}

// ============================================================================
// Full flow
// ============================================================================

#[tokio::test]
async fn test_scan_against_firestore_marks_ticket_once() {
    let server = MockServer::start().await;
    mount_query(&server, json!([ticket_row("t1", "sold")])).await;
    Mock::given(method("PATCH"))
        .and(path(ticket_path("t1")))
        .respond_with(scanned_document())
        .expect(1)
        .mount(&server)
        .await;

    let scan_store = ScanStore::new(ScanEnvironment::new(
        Arc::new(test_clock()),
        Arc::new(store(&server)),
        scope(),
    ));
    let mut actions = scan_store.subscribe_actions();

    scan_store.decode("ABC123", BarcodeFormat::Code128).await.unwrap();
    let session = scan_store
        .wait_for_result(Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(session.scan_result(), Some(ScanResult::Valid));
    assert!(scan_store.view().await.to_string().contains("Ticket Number: A-17"));

    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let action = actions.recv().await.unwrap();
            if let ScanAction::StatusUpdateFinished { outcome, .. } = action {
                return outcome;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(finished, StatusUpdateOutcome::Applied);
}
