//! End-to-end scan flows through `ScanStore`
//!
//! Each test drives the store the way a UI shell would: feed a decode,
//! wait for the result card, press its button.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::Arc;
use std::time::Duration;
use ticket_scan::lookup::{LOOKUP_FAILED, LookupVerdict, StatusUpdateOutcome, TICKET_NOT_FOUND};
use ticket_scan::mocks::InMemoryTicketStore;
use ticket_scan::scan::ScanResult;
use ticket_scan::{
    Affordance, BarcodeFormat, EventId, EventScope, OrganiserId, ScanAction, ScanEnvironment,
    ScanSession, ScanStore, ScanView, Ticket, TicketId, TicketStatus,
};
use ticket_scan_testing::{init_test_tracing, test_clock};
use tokio::sync::broadcast;

// ============================================================================
// Test Fixtures
// ============================================================================

const WAIT: Duration = Duration::from_secs(2);

fn scope() -> EventScope {
    EventScope::new(OrganiserId::new("org-1"), EventId::new("evt-1"))
}

fn store_with(tickets: &InMemoryTicketStore, lookup_timeout: Duration) -> ScanStore {
    init_test_tracing();
    ScanStore::new(
        ScanEnvironment::new(Arc::new(test_clock()), Arc::new(tickets.clone()), scope())
            .with_lookup_timeout(lookup_timeout),
    )
}

async fn scan(store: &ScanStore, barcode: &str) -> ScanSession {
    store.decode(barcode, BarcodeFormat::Code128).await.unwrap();
    store.wait_for_result(WAIT).await.unwrap()
}

/// Wait for the first broadcast action matching `predicate`.
async fn next_matching<F>(actions: &mut broadcast::Receiver<ScanAction>, predicate: F) -> ScanAction
where
    F: Fn(&ScanAction) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let action = actions.recv().await.unwrap();
            if predicate(&action) {
                return action;
            }
        }
    })
    .await
    .expect("expected action was not broadcast")
}

fn is_status_update(action: &ScanAction) -> bool {
    matches!(action, ScanAction::StatusUpdateFinished { .. })
}

// ============================================================================
// Lookup outcomes
// ============================================================================

#[tokio::test]
async fn test_valid_ticket_is_shown_and_marked_scanned() {
    let tickets = InMemoryTicketStore::new();
    tickets.insert(
        &scope(),
        TicketId::new("t1"),
        Ticket::new("ABC123", TicketStatus::Sold)
            .owned_by("Alice")
            .price(20),
    );
    let store = store_with(&tickets, Duration::from_secs(5));
    let mut actions = store.subscribe_actions();

    let session = scan(&store, "ABC123").await;
    assert_eq!(session.scan_result(), Some(ScanResult::Valid));
    assert!(session.is_valid_ticket());

    let view = store.view().await;
    assert!(view.to_string().contains("Owned By: Alice"));
    assert!(view.to_string().contains("Price: 20"));
    assert_eq!(view.affordance(), Some(Affordance::ApproveEntry));

    let finished = next_matching(&mut actions, is_status_update).await;
    assert!(matches!(
        finished,
        ScanAction::StatusUpdateFinished { outcome: StatusUpdateOutcome::Applied, .. }
    ));

    let calls = tickets.update_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "organiser/org-1/events/evt-1/tickets/t1");
    assert_eq!(calls[0].status, TicketStatus::Scanned);
    assert_eq!(
        tickets.ticket(&scope(), &TicketId::new("t1")).map(|t| t.status),
        Some(TicketStatus::Scanned)
    );
}

#[tokio::test]
async fn test_unknown_barcode_shows_not_found() {
    let tickets = InMemoryTicketStore::new();
    let store = store_with(&tickets, Duration::from_secs(5));

    let session = scan(&store, "ZZZ999").await;

    assert_eq!(session.scan_result(), Some(ScanResult::Invalid));
    assert_eq!(session.message(), Some(TICKET_NOT_FOUND));
    assert_eq!(store.view().await.affordance(), Some(Affordance::Retry));
    assert!(tickets.update_calls().is_empty());
}

#[tokio::test]
async fn test_scanned_ticket_shows_already_used() {
    let tickets = InMemoryTicketStore::new();
    tickets.insert(
        &scope(),
        TicketId::new("t1"),
        Ticket::new("ABC123", TicketStatus::Scanned),
    );
    let store = store_with(&tickets, Duration::from_secs(5));

    let session = scan(&store, "ABC123").await;

    assert_eq!(session.scan_result(), Some(ScanResult::AlreadyScanned));
    assert!(store.view().await.to_string().contains("Ticket has already been used"));
    assert!(tickets.update_calls().is_empty());
}

#[tokio::test]
async fn test_store_error_shows_lookup_failure() {
    let tickets = InMemoryTicketStore::new();
    tickets.fail_lookups("connection reset");
    let store = store_with(&tickets, Duration::from_secs(5));

    let session = scan(&store, "ABC123").await;

    assert_eq!(session.message(), Some(LOOKUP_FAILED));
    assert!(!session.is_valid_ticket());
}

#[tokio::test]
async fn test_duplicate_barcodes_use_first_match() {
    let tickets = InMemoryTicketStore::new();
    tickets.insert(
        &scope(),
        TicketId::new("first"),
        Ticket::new("DUP1", TicketStatus::Sold).owned_by("Bob"),
    );
    tickets.insert(
        &scope(),
        TicketId::new("second"),
        Ticket::new("DUP1", TicketStatus::Scanned),
    );
    let store = store_with(&tickets, Duration::from_secs(5));

    let session = scan(&store, "DUP1").await;

    assert_eq!(session.ticket_id(), Some(&TicketId::new("first")));
    assert!(session.is_valid_ticket());
}

#[tokio::test]
async fn test_tickets_of_other_events_are_not_found() {
    let tickets = InMemoryTicketStore::new();
    let other = EventScope::new(OrganiserId::new("org-1"), EventId::new("evt-2"));
    tickets.insert(&other, TicketId::new("t1"), Ticket::new("ABC123", TicketStatus::Sold));
    let store = store_with(&tickets, Duration::from_secs(5));

    let session = scan(&store, "ABC123").await;

    assert_eq!(session.message(), Some(TICKET_NOT_FOUND));
}

// ============================================================================
// Timeouts and races
// ============================================================================

#[tokio::test]
async fn test_slow_lookup_times_out() {
    let tickets = InMemoryTicketStore::new();
    tickets.insert(&scope(), TicketId::new("t1"), Ticket::new("ABC123", TicketStatus::Sold));
    tickets.delay_lookups(Duration::from_millis(500));
    let store = store_with(&tickets, Duration::from_millis(50));
    let mut actions = store.subscribe_actions();

    let mut handle = store.decode("ABC123", BarcodeFormat::Code128).await.unwrap();
    let session = store.wait_for_result(WAIT).await.unwrap();
    assert_eq!(session.message(), Some(LOOKUP_FAILED));

    // The lookup is abandoned at the timeout, so no late result follows
    handle
        .wait_with_timeout(Duration::from_millis(300))
        .await
        .unwrap();
    assert!(matches!(actions.try_recv(), Ok(ScanAction::LookupTimedOut { .. })));
    assert!(actions.try_recv().is_err());
    assert_eq!(store.session().await, session);
    assert!(tickets.update_calls().is_empty());
}

#[tokio::test]
async fn test_resolved_scan_leaves_nothing_running() {
    let tickets = InMemoryTicketStore::new();
    let store = store_with(&tickets, Duration::from_secs(30));

    let mut handle = store.decode("ZZZ999", BarcodeFormat::Code128).await.unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(store.session().await.message(), Some(TICKET_NOT_FOUND));

    store.shutdown(Duration::from_millis(200)).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_scan_elsewhere_turns_valid_into_already_scanned() {
    let tickets = InMemoryTicketStore::new();
    let revision = tickets.insert(
        &scope(),
        TicketId::new("t1"),
        Ticket::new("ABC123", TicketStatus::Sold),
    );
    tickets.delay_lookups(Duration::from_secs(60));
    let store = store_with(&tickets, Duration::from_secs(60));
    let mut actions = store.subscribe_actions();

    store.decode("ABC123", BarcodeFormat::Code128).await.unwrap();
    let scan_id = store.session().await.scan_id().unwrap();

    // Another scanner admits the ticket after this lookup read it
    tickets.set_status_externally(&scope(), &TicketId::new("t1"), TicketStatus::Scanned);
    store
        .dispatch(ScanAction::LookupCompleted {
            scan_id,
            verdict: LookupVerdict::Valid {
                ticket_id: TicketId::new("t1"),
                ticket: Ticket::new("ABC123", TicketStatus::Sold),
                revision: Some(revision),
            },
        })
        .await
        .unwrap();

    let finished = next_matching(&mut actions, is_status_update).await;
    assert!(matches!(
        finished,
        ScanAction::StatusUpdateFinished { outcome: StatusUpdateOutcome::Conflict, .. }
    ));

    let session = store.session().await;
    assert_eq!(session.scan_result(), Some(ScanResult::AlreadyScanned));
    assert_eq!(store.view().await.affordance(), Some(Affordance::Confirm));
    assert_eq!(tickets.update_calls().len(), 1);
}

#[tokio::test]
async fn test_failed_write_keeps_valid_card() {
    let tickets = InMemoryTicketStore::new();
    tickets.insert(&scope(), TicketId::new("t1"), Ticket::new("ABC123", TicketStatus::Sold));
    tickets.fail_updates("permission denied");
    let store = store_with(&tickets, Duration::from_secs(5));
    let mut actions = store.subscribe_actions();

    scan(&store, "ABC123").await;
    let finished = next_matching(&mut actions, is_status_update).await;

    assert!(matches!(
        finished,
        ScanAction::StatusUpdateFinished { outcome: StatusUpdateOutcome::Failed(_), .. }
    ));
    assert!(store.session().await.is_valid_ticket());
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn test_approve_entry_returns_to_camera_for_next_scan() {
    let tickets = InMemoryTicketStore::new();
    tickets.insert(&scope(), TicketId::new("t1"), Ticket::new("ABC123", TicketStatus::Sold));
    tickets.insert(&scope(), TicketId::new("t2"), Ticket::new("DEF456", TicketStatus::Sold));
    let store = store_with(&tickets, Duration::from_secs(5));

    scan(&store, "ABC123").await;
    // A second decode while the card is up is ignored
    store.decode("DEF456", BarcodeFormat::Code128).await.unwrap();
    assert_eq!(store.session().await.ticket_id(), Some(&TicketId::new("t1")));

    let button = store.view().await.affordance().unwrap();
    store.dispatch(button.action()).await.unwrap();
    assert_eq!(store.session().await, ScanSession::default());
    assert_eq!(store.view().await, ScanView::Camera);

    let session = scan(&store, "DEF456").await;
    assert_eq!(session.ticket_id(), Some(&TicketId::new("t2")));
    assert_eq!(tickets.query_count(), 2);
}

#[tokio::test]
async fn test_retry_after_failure_allows_rescan() {
    let tickets = InMemoryTicketStore::new();
    let store = store_with(&tickets, Duration::from_secs(5));

    scan(&store, "ZZZ999").await;
    store.dispatch(ScanAction::Retry).await.unwrap();
    assert!(store.view().await.camera_active());

    tickets.insert(&scope(), TicketId::new("t9"), Ticket::new("ZZZ999", TicketStatus::Sold));
    let session = scan(&store, "ZZZ999").await;
    assert!(session.is_valid_ticket());
}
