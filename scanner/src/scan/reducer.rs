//! Reducer for the scan controller.

use crate::lookup::{LOOKUP_FAILED, LookupVerdict, StatusUpdateOutcome};
use crate::scan::{ScanAction, ScanEnvironment, ScanId, ScanSession, ScanState};
use crate::types::{Ticket, TicketId, TicketStatus};
use chrono::{DateTime, Utc};
use smallvec::{SmallVec, smallvec};
use crate::metrics::{
    SCANNER_ENTRIES_APPROVED_TOTAL, SCANNER_SCANS_TOTAL, SCANNER_STATUS_UPDATES_TOTAL,
};
use ticket_scan_core::{async_effect, effect::Effect, reducer::Reducer};

/// Message shown for a matched ticket whose status is neither sold nor scanned
pub const NOT_VALID_FOR_ENTRY: &str = "Ticket is not valid for entry";

/// Drives a scan from decode to result and back to idle.
///
/// - `Idle` + decode → `Resolving`, with a lookup effect bounded by the timeout
/// - `Resolving` + verdict → `Valid`, `Invalid` or `AlreadyScanned`
/// - `Valid` on entry also emits the single mark-as-scanned write
/// - any result + Retry/Confirm/ApproveEntry → `Idle`
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanReducer;

impl ScanReducer {
    /// Create a new scan reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn resolve(
        state: &mut ScanSession,
        scan_id: ScanId,
        verdict: LookupVerdict,
        env: &ScanEnvironment,
    ) -> SmallVec<[Effect<ScanAction>; 4]> {
        let (ticket_id, ticket, revision) = match verdict {
            LookupVerdict::Invalid { message } => {
                state.state = ScanState::Invalid { scan_id, message };
                count_scan(state);
                return smallvec![Effect::None];
            },
            LookupVerdict::Valid {
                ticket_id,
                ticket,
                revision,
            } => (ticket_id, ticket, revision),
        };

        match ticket.status.clone() {
            TicketStatus::Sold => {
                tracing::info!(%scan_id, %ticket_id, "Ticket valid");
                state.state = ScanState::Valid {
                    scan_id,
                    ticket_id: ticket_id.clone(),
                    ticket,
                };
                count_scan(state);

                let client = env.lookup().clone();
                let scope = env.scope().clone();
                smallvec![async_effect! {
                    let outcome = client.update_status(&scope, &ticket_id, revision).await;
                    Some(ScanAction::StatusUpdateFinished {
                        scan_id,
                        ticket_id,
                        outcome,
                    })
                }]
            },
            TicketStatus::Scanned => {
                tracing::info!(%scan_id, %ticket_id, "Ticket already scanned");
                state.state = ScanState::AlreadyScanned {
                    scan_id,
                    ticket_id,
                    ticket,
                };
                count_scan(state);
                smallvec![Effect::None]
            },
            TicketStatus::Other(status) => {
                tracing::info!(%scan_id, %ticket_id, %status, "Ticket status not accepted");
                state.state = ScanState::Invalid {
                    scan_id,
                    message: NOT_VALID_FOR_ENTRY.to_string(),
                };
                count_scan(state);
                smallvec![Effect::None]
            },
        }
    }

    fn status_update_finished(
        state: &mut ScanSession,
        scan_id: ScanId,
        ticket_id: &TicketId,
        outcome: StatusUpdateOutcome,
    ) {
        metrics::counter!(SCANNER_STATUS_UPDATES_TOTAL, "outcome" => outcome.label()).increment(1);

        match outcome {
            StatusUpdateOutcome::Applied => {
                tracing::debug!(%scan_id, %ticket_id, "Ticket marked as scanned");
            },
            StatusUpdateOutcome::Failed(reason) => {
                // The result on screen stays as it is
                tracing::error!(%scan_id, %ticket_id, %reason, "Failed to mark ticket as scanned");
            },
            StatusUpdateOutcome::Conflict => {
                let shown = match &state.state {
                    ScanState::Valid {
                        scan_id: current,
                        ticket_id: shown,
                        ticket,
                    } if *current == scan_id && shown == ticket_id => Some(ticket.clone()),
                    _ => None,
                };

                if let Some(ticket) = shown {
                    tracing::warn!(%scan_id, %ticket_id, "Ticket was scanned elsewhere first");
                    state.state = ScanState::AlreadyScanned {
                        scan_id,
                        ticket_id: ticket_id.clone(),
                        ticket: Ticket {
                            status: TicketStatus::Scanned,
                            ..ticket
                        },
                    };
                    count_scan(state);
                } else {
                    tracing::warn!(
                        %scan_id,
                        %ticket_id,
                        "Conflicting status update for a scan no longer shown"
                    );
                }
            },
        }
    }
}

/// Start time of `scan_id` if it is the lookup in flight
fn resolving_since(state: &ScanSession, scan_id: ScanId) -> Option<DateTime<Utc>> {
    match &state.state {
        ScanState::Resolving {
            scan_id: current,
            started_at,
            ..
        } if *current == scan_id => Some(*started_at),
        _ => None,
    }
}

/// Record the result now on screen
fn count_scan(state: &ScanSession) {
    if let Some(result) = state.scan_result() {
        metrics::counter!(SCANNER_SCANS_TOTAL, "result" => result.label()).increment(1);
    }
}

impl Reducer for ScanReducer {
    type State = ScanSession;
    type Action = ScanAction;
    type Environment = ScanEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ScanAction::BarcodeDecoded { data, format } => {
                if state.barcode_scanned() {
                    tracing::trace!("Decode ignored while a scan is active");
                    return smallvec![Effect::None];
                }
                if !env.settings().accepts(format) {
                    tracing::debug!(%format, "Decode ignored: unsupported barcode format");
                    return smallvec![Effect::None];
                }
                let barcode = data.trim().to_string();
                if barcode.is_empty() {
                    tracing::debug!("Decode ignored: empty barcode");
                    return smallvec![Effect::None];
                }

                let scan_id = ScanId::new();
                tracing::debug!(%scan_id, %barcode, "Barcode decoded, looking up ticket");
                state.state = ScanState::Resolving {
                    scan_id,
                    barcode: barcode.clone(),
                    started_at: env.clock().now(),
                };

                let client = env.lookup().clone();
                let scope = env.scope().clone();
                let timeout = env.lookup_timeout();
                // Losing the race drops the lookup future
                smallvec![async_effect! {
                    match tokio::time::timeout(timeout, client.lookup(&scope, &barcode)).await {
                        Ok(verdict) => Some(ScanAction::LookupCompleted { scan_id, verdict }),
                        Err(_) => Some(ScanAction::LookupTimedOut { scan_id }),
                    }
                }]
            },

            ScanAction::LookupCompleted { scan_id, verdict } => {
                let Some(started_at) = resolving_since(state, scan_id) else {
                    tracing::warn!(%scan_id, "Dropping lookup result for a scan no longer active");
                    return smallvec![Effect::None];
                };

                let elapsed_ms = env
                    .clock()
                    .now()
                    .signed_duration_since(started_at)
                    .num_milliseconds();
                tracing::debug!(%scan_id, elapsed_ms, "Lookup completed");
                Self::resolve(state, scan_id, verdict, env)
            },

            ScanAction::LookupTimedOut { scan_id } => {
                if resolving_since(state, scan_id).is_some() {
                    tracing::warn!(%scan_id, timeout = ?env.lookup_timeout(), "Ticket lookup timed out");
                    state.state = ScanState::Invalid {
                        scan_id,
                        message: LOOKUP_FAILED.to_string(),
                    };
                    count_scan(state);
                }
                // Otherwise the lookup already resolved this scan
                smallvec![Effect::None]
            },

            ScanAction::StatusUpdateFinished {
                scan_id,
                ticket_id,
                outcome,
            } => {
                Self::status_update_finished(state, scan_id, &ticket_id, outcome);
                smallvec![Effect::None]
            },

            reset @ (ScanAction::Retry | ScanAction::Confirm | ScanAction::ApproveEntry) => {
                if !state.is_terminal() {
                    tracing::trace!(action = ?reset, "Reset ignored: no result on screen");
                    return smallvec![Effect::None];
                }

                if let (ScanAction::ApproveEntry, ScanState::Valid { scan_id, ticket_id, .. }) =
                    (&reset, &state.state)
                {
                    tracing::info!(
                        %scan_id,
                        %ticket_id,
                        admitted_at = %env.clock().now(),
                        "Entry approved"
                    );
                    metrics::counter!(SCANNER_ENTRIES_APPROVED_TOTAL).increment(1);
                }

                tracing::debug!(action = ?reset, "Session reset");
                *state = ScanSession::default();
                smallvec![Effect::None]
            },
        }
    }
}
