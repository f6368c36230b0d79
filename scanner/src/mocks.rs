//! In-memory implementations for testing.
//!
//! [`InMemoryTicketStore`] keeps tickets in a map, bumps a revision on every
//! write and records each status update so tests can assert on them.

use crate::lookup::{Revision, StoredTicket, TicketStore, TicketStoreError};
use crate::types::{EventScope, Ticket, TicketId, TicketStatus};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A recorded `set_status` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdateCall {
    /// Document path the write targeted
    pub path: String,
    /// Status written
    pub status: TicketStatus,
    /// Precondition revision, if any
    pub revision: Option<Revision>,
}

#[derive(Debug)]
struct StoredRecord {
    ticket: Ticket,
    revision: Revision,
}

#[derive(Debug, Default)]
struct Inner {
    /// Keyed by full document path; insertion order kept separately
    records: BTreeMap<String, StoredRecord>,
    order: Vec<(EventScope, TicketId)>,
    writes: i64,
    queries: usize,
    updates: Vec<StatusUpdateCall>,
    lookup_failure: Option<String>,
    update_failure: Option<String>,
    lookup_delay: Option<Duration>,
}

impl Inner {
    fn next_revision(&mut self) -> Revision {
        self.writes += 1;
        DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(self.writes)
    }
}

/// In-memory [`TicketStore`]
///
/// Cloning shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTicketStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryTicketStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a ticket and return its new revision.
    pub fn insert(&self, scope: &EventScope, ticket_id: TicketId, ticket: Ticket) -> Revision {
        let mut inner = self.lock();
        let revision = inner.next_revision();
        let path = scope.ticket_path(&ticket_id);
        if !inner.records.contains_key(&path) {
            inner.order.push((scope.clone(), ticket_id));
        }
        inner.records.insert(path, StoredRecord { ticket, revision });
        revision
    }

    /// Current contents of a ticket.
    #[must_use]
    pub fn ticket(&self, scope: &EventScope, ticket_id: &TicketId) -> Option<Ticket> {
        self.lock()
            .records
            .get(&scope.ticket_path(ticket_id))
            .map(|record| record.ticket.clone())
    }

    /// Change a ticket's status as another scanner would, bumping its revision.
    pub fn set_status_externally(
        &self,
        scope: &EventScope,
        ticket_id: &TicketId,
        status: TicketStatus,
    ) {
        let mut inner = self.lock();
        let revision = inner.next_revision();
        if let Some(record) = inner.records.get_mut(&scope.ticket_path(ticket_id)) {
            record.ticket.status = status;
            record.revision = revision;
        }
    }

    /// Make every lookup fail with `Unavailable(reason)`.
    pub fn fail_lookups(&self, reason: impl Into<String>) {
        self.lock().lookup_failure = Some(reason.into());
    }

    /// Make every status update fail with `Unavailable(reason)`.
    pub fn fail_updates(&self, reason: impl Into<String>) {
        self.lock().update_failure = Some(reason.into());
    }

    /// Delay every lookup by `delay`.
    pub fn delay_lookups(&self, delay: Duration) {
        self.lock().lookup_delay = Some(delay);
    }

    /// Number of `find_by_barcode` calls so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.lock().queries
    }

    /// Every `set_status` call so far, in order.
    #[must_use]
    pub fn update_calls(&self) -> Vec<StatusUpdateCall> {
        self.lock().updates.clone()
    }
}

impl TicketStore for InMemoryTicketStore {
    fn find_by_barcode<'a>(
        &'a self,
        scope: &'a EventScope,
        barcode: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StoredTicket>, TicketStoreError>> {
        Box::pin(async move {
            let delay = {
                let mut inner = self.lock();
                inner.queries += 1;
                inner.lookup_delay
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let inner = self.lock();
            if let Some(reason) = &inner.lookup_failure {
                return Err(TicketStoreError::Unavailable(reason.clone()));
            }

            Ok(inner
                .order
                .iter()
                .filter(|(ticket_scope, _)| ticket_scope == scope)
                .filter_map(|(_, id)| {
                    let record = inner.records.get(&scope.ticket_path(id))?;
                    (record.ticket.ticket_barcode == barcode).then(|| StoredTicket {
                        id: id.clone(),
                        ticket: record.ticket.clone(),
                        revision: Some(record.revision),
                    })
                })
                .collect())
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
            let path = scope.ticket_path(ticket_id);
            let mut inner = self.lock();
            inner.updates.push(StatusUpdateCall {
                path: path.clone(),
                status: status.clone(),
                revision,
            });

            if let Some(reason) = &inner.update_failure {
                return Err(TicketStoreError::Unavailable(reason.clone()));
            }

            let current = inner
                .records
                .get(&path)
                .map(|record| record.revision)
                .ok_or_else(|| TicketStoreError::NotFound(ticket_id.to_string()))?;
            if revision.is_some_and(|expected| expected != current) {
                return Err(TicketStoreError::Conflict);
            }

            let next = inner.next_revision();
            if let Some(record) = inner.records.get_mut(&path) {
                record.ticket.status = status;
                record.revision = next;
            }
            Ok(())
        })
    }
}
