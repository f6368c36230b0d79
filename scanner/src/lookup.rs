//! Ticket lookup over a remote document store.
//!
//! [`TicketLookupClient`] turns store results into the verdicts the scan
//! controller acts on. It never fails: every store error is logged and folded
//! into a verdict or outcome. The store itself sits behind the
//! [`TicketStore`] trait; [`FirestoreTicketStore`] is the production
//! implementation and `mocks::InMemoryTicketStore` the test one.

use crate::types::{EventScope, Ticket, TicketId, TicketStatus};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use ticket_scan_firestore::{FirestoreClient, FirestoreError, Precondition, Value};

/// Message shown when no ticket matches the barcode
pub const TICKET_NOT_FOUND: &str = "Ticket not found";

/// Message shown when the lookup could not be completed
pub const LOOKUP_FAILED: &str = "Error checking ticket validity";

/// Version marker of a stored ticket (its last update time)
pub type Revision = DateTime<Utc>;

/// Errors reported by a [`TicketStore`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketStoreError {
    /// The store could not be reached or rejected the request
    #[error("ticket store unavailable: {0}")]
    Unavailable(String),

    /// A stored record does not look like a ticket
    #[error("could not decode ticket {ticket_id}: {reason}")]
    Decode {
        /// Document id of the record
        ticket_id: String,
        /// Decoder message
        reason: String,
    },

    /// The ticket changed after it was read
    #[error("ticket was modified by another writer")]
    Conflict,

    /// The ticket no longer exists
    #[error("ticket not found: {0}")]
    NotFound(String),
}

/// A ticket together with its identity and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTicket {
    /// Document id
    pub id: TicketId,
    /// Record contents
    pub ticket: Ticket,
    /// Last update time, when the store reports one
    pub revision: Option<Revision>,
}

/// Storage backend for tickets.
///
/// Methods return boxed futures so the trait can be used as
/// `Arc<dyn TicketStore>`.
pub trait TicketStore: Send + Sync {
    /// All tickets in `scope` whose barcode equals `barcode`, in store order.
    ///
    /// Records that cannot be decoded are skipped as long as another one matches.
    ///
    /// # Errors
    ///
    /// Returns [`TicketStoreError`] if the query fails or no matching record
    /// can be decoded.
    fn find_by_barcode<'a>(
        &'a self,
        scope: &'a EventScope,
        barcode: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StoredTicket>, TicketStoreError>>;

    /// Overwrite the ticket's `status`, leaving other fields untouched.
    ///
    /// With a `revision`, the write only succeeds if the ticket has not
    /// changed since that revision.
    ///
    /// # Errors
    ///
    /// - [`TicketStoreError::Conflict`] if the revision no longer matches
    /// - [`TicketStoreError::NotFound`] if the ticket is gone
    /// - [`TicketStoreError::Unavailable`] otherwise
    fn set_status<'a>(
        &'a self,
        scope: &'a EventScope,
        ticket_id: &'a TicketId,
        status: TicketStatus,
        revision: Option<Revision>,
    ) -> BoxFuture<'a, Result<(), TicketStoreError>>;
}

impl<T: TicketStore + ?Sized> TicketStore for Arc<T> {
    fn find_by_barcode<'a>(
        &'a self,
        scope: &'a EventScope,
        barcode: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StoredTicket>, TicketStoreError>> {
        (**self).find_by_barcode(scope, barcode)
    }

    fn set_status<'a>(
        &'a self,
        scope: &'a EventScope,
        ticket_id: &'a TicketId,
        status: TicketStatus,
        revision: Option<Revision>,
    ) -> BoxFuture<'a, Result<(), TicketStoreError>> {
        (**self).set_status(scope, ticket_id, status, revision)
    }
}

/// A type-erased, shareable ticket store
pub type SharedTicketStore = Arc<dyn TicketStore>;

/// Result of looking a barcode up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupVerdict {
    /// A ticket with this barcode exists (its status is not judged here)
    Valid {
        /// Document id of the match
        ticket_id: TicketId,
        /// The matched record
        ticket: Ticket,
        /// Version to condition the status update on
        revision: Option<Revision>,
    },
    /// No usable ticket
    Invalid {
        /// Human-readable reason
        message: String,
    },
}

impl LookupVerdict {
    /// An `Invalid` verdict with `message`.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Result of the mark-as-scanned write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdateOutcome {
    /// The ticket is now `scanned`
    Applied,
    /// Another writer changed the ticket first
    Conflict,
    /// The write failed for another reason
    Failed(String),
}

impl StatusUpdateOutcome {
    /// Metric label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Conflict => "conflict",
            Self::Failed(_) => "failed",
        }
    }
}

/// Looks tickets up by barcode and marks them as scanned.
#[derive(Debug, Clone)]
pub struct TicketLookupClient<S> {
    store: S,
}

impl<S: TicketStore> TicketLookupClient<S> {
    /// Create a client over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Look `barcode` up among the tickets of `scope`.
    ///
    /// When several tickets share the barcode the first one the store returns
    /// wins; store order is unspecified.
    #[tracing::instrument(skip(self, scope), fields(scope = %scope))]
    pub async fn lookup(&self, scope: &EventScope, barcode: &str) -> LookupVerdict {
        let matches = match self.store.find_by_barcode(scope, barcode).await {
            Ok(matches) => matches,
            Err(error) => {
                tracing::error!(%error, "Error checking ticket validity");
                return LookupVerdict::invalid(LOOKUP_FAILED);
            },
        };

        if matches.len() > 1 {
            tracing::warn!(
                matches = matches.len(),
                "Barcode matches several tickets; using the first"
            );
        }

        match matches.into_iter().next() {
            Some(StoredTicket {
                id,
                ticket,
                revision,
            }) => {
                tracing::info!(ticket_id = %id, status = %ticket.status, "Ticket found");
                LookupVerdict::Valid {
                    ticket_id: id,
                    ticket,
                    revision,
                }
            },
            None => {
                tracing::info!("Ticket not found");
                LookupVerdict::invalid(TICKET_NOT_FOUND)
            },
        }
    }

    /// Mark the ticket as `scanned`.
    ///
    /// Best effort: failures are logged and reported as an outcome.
    #[tracing::instrument(skip(self, scope, ticket_id), fields(scope = %scope, ticket_id = %ticket_id))]
    pub async fn update_status(
        &self,
        scope: &EventScope,
        ticket_id: &TicketId,
        revision: Option<Revision>,
    ) -> StatusUpdateOutcome {
        match self
            .store
            .set_status(scope, ticket_id, TicketStatus::Scanned, revision)
            .await
        {
            Ok(()) => {
                tracing::debug!("Ticket status updated to scanned");
                StatusUpdateOutcome::Applied
            },
            Err(TicketStoreError::Conflict) => {
                tracing::warn!("Ticket was scanned elsewhere before the update landed");
                StatusUpdateOutcome::Conflict
            },
            Err(error) => {
                tracing::error!(%error, "Error updating ticket status");
                StatusUpdateOutcome::Failed(error.to_string())
            },
        }
    }
}

/// [`TicketStore`] backed by Firestore.
///
/// Tickets live at `organiser/{orgId}/events/{eventId}/tickets/{ticketId}`.
#[derive(Debug, Clone)]
pub struct FirestoreTicketStore {
    client: FirestoreClient,
}

impl FirestoreTicketStore {
    /// Field the barcode is stored in
    pub const BARCODE_FIELD: &'static str = "ticketBarcode";

    /// Wrap a Firestore client.
    #[must_use]
    pub const fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

impl TicketStore for FirestoreTicketStore {
    fn find_by_barcode<'a>(
        &'a self,
        scope: &'a EventScope,
        barcode: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StoredTicket>, TicketStoreError>> {
        Box::pin(async move {
            let documents = self
                .client
                .query_equal(
                    &scope.event_path(),
                    EventScope::TICKETS_COLLECTION,
                    Self::BARCODE_FIELD,
                    Value::string(barcode),
                )
                .await
                .map_err(|e| TicketStoreError::Unavailable(e.to_string()))?;

            let mut tickets = Vec::with_capacity(documents.len());
            let mut first_error = None;
            for document in documents {
                match document.decode::<Ticket>() {
                    Ok(ticket) => tickets.push(StoredTicket {
                        id: TicketId::new(document.id()),
                        ticket,
                        revision: document.update_time,
                    }),
                    Err(error) => {
                        tracing::warn!(ticket_id = document.id(), %error, "Skipping undecodable ticket");
                        first_error.get_or_insert_with(|| TicketStoreError::Decode {
                            ticket_id: document.id().to_string(),
                            reason: error.to_string(),
                        });
                    },
                }
            }

            // Only fail when nothing usable matched
            match first_error {
                Some(error) if tickets.is_empty() => Err(error),
                _ => Ok(tickets),
            }
        })
    }

    fn set_status<'a>(
        &'a self,
        scope: &'a EventScope,
        ticket_id: &'a TicketId,
        status: TicketStatus,
        revision: Option<Revision>,
    ) -> BoxFuture<'a, Result<(), TicketStoreError>> {
        Box::pin(async move {
            let fields = BTreeMap::from([("status".to_string(), Value::string(status.as_str()))]);
            // A PATCH without a precondition would create a missing document
            let precondition = revision.map_or(Precondition::Exists(true), Precondition::UpdateTime);

            self.client
                .update_fields(&scope.ticket_path(ticket_id), fields, Some(precondition))
                .await
                .map(|_| ())
                .map_err(|error| match error {
                    FirestoreError::PreconditionFailed(_) if revision.is_some() => {
                        TicketStoreError::Conflict
                    },
                    FirestoreError::PreconditionFailed(_) | FirestoreError::NotFound(_) => {
                        TicketStoreError::NotFound(ticket_id.to_string())
                    },
                    other => TicketStoreError::Unavailable(other.to_string()),
                })
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use crate::mocks::InMemoryTicketStore;
    use crate::types::{EventId, OrganiserId};

    fn scope() -> EventScope {
        EventScope::new(OrganiserId::new("org-1"), EventId::new("evt-1"))
    }

    #[tokio::test]
    async fn test_lookup_match_returns_ticket_and_id() {
        let store = InMemoryTicketStore::new();
        let ticket = Ticket::new("ABC123", TicketStatus::Sold).owned_by("Alice");
        store.insert(&scope(), TicketId::new("t1"), ticket.clone());

        let client = TicketLookupClient::new(store);
        let verdict = client.lookup(&scope(), "ABC123").await;

        match verdict {
            LookupVerdict::Valid {
                ticket_id,
                ticket: found,
                revision,
            } => {
                assert_eq!(ticket_id, TicketId::new("t1"));
                assert_eq!(found, ticket);
                assert!(revision.is_some());
            },
            LookupVerdict::Invalid { message } => unreachable!("unexpected invalid: {message}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_no_match() {
        let client = TicketLookupClient::new(InMemoryTicketStore::new());
        assert_eq!(
            client.lookup(&scope(), "ZZZ999").await,
            LookupVerdict::invalid(TICKET_NOT_FOUND)
        );
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_event() {
        let store = InMemoryTicketStore::new();
        let other = EventScope::new(OrganiserId::new("org-1"), EventId::new("evt-2"));
        store.insert(&other, TicketId::new("t1"), Ticket::new("ABC123", TicketStatus::Sold));

        let client = TicketLookupClient::new(store);
        assert_eq!(
            client.lookup(&scope(), "ABC123").await,
            LookupVerdict::invalid(TICKET_NOT_FOUND)
        );
    }

    #[tokio::test]
    async fn test_lookup_store_failure_becomes_invalid() {
        let store = InMemoryTicketStore::new();
        store.fail_lookups("connection reset");

        let client = TicketLookupClient::new(store);
        assert_eq!(
            client.lookup(&scope(), "ABC123").await,
            LookupVerdict::invalid(LOOKUP_FAILED)
        );
    }

    #[tokio::test]
    async fn test_duplicate_barcodes_take_first() {
        let store = InMemoryTicketStore::new();
        store.insert(&scope(), TicketId::new("a"), Ticket::new("DUP", TicketStatus::Sold));
        store.insert(&scope(), TicketId::new("b"), Ticket::new("DUP", TicketStatus::Scanned));

        let client = TicketLookupClient::new(store);
        let verdict = client.lookup(&scope(), "DUP").await;
        assert!(matches!(
            verdict,
            LookupVerdict::Valid { ref ticket_id, .. } if ticket_id.as_str() == "a"
        ));
    }

    #[tokio::test]
    async fn test_update_status_outcomes() {
        let store = InMemoryTicketStore::new();
        let id = TicketId::new("t1");
        let revision = store.insert(&scope(), id.clone(), Ticket::new("ABC123", TicketStatus::Sold));
        let client = TicketLookupClient::new(store.clone());

        // Stale revision: someone else touched the ticket
        store.set_status_externally(&scope(), &id, TicketStatus::Scanned);
        assert_eq!(
            client.update_status(&scope(), &id, Some(revision)).await,
            StatusUpdateOutcome::Conflict
        );

        // Unconditional write goes through
        assert_eq!(
            client.update_status(&scope(), &id, None).await,
            StatusUpdateOutcome::Applied
        );

        // Missing ticket
        let outcome = client
            .update_status(&scope(), &TicketId::new("nope"), None)
            .await;
        assert!(matches!(outcome, StatusUpdateOutcome::Failed(_)));

        assert_eq!(store.update_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_update_failure_is_reported_not_raised() {
        let store = InMemoryTicketStore::new();
        let id = TicketId::new("t1");
        let revision = store.insert(&scope(), id.clone(), Ticket::new("ABC123", TicketStatus::Sold));
        store.fail_updates("quota exceeded");

        let client = TicketLookupClient::new(store.clone());
        let outcome = client.update_status(&scope(), &id, Some(revision)).await;

        assert_eq!(outcome.label(), "failed");
        assert_eq!(
            store.ticket(&scope(), &id).map(|t| t.status),
            Some(TicketStatus::Sold)
        );
    }
}
