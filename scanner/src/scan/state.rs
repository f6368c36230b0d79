//! Scan session state.

use crate::types::{Ticket, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one decode-to-resolution cycle.
///
/// Generated when a decode starts a lookup and carried by every action that
/// results from it, so results that arrive after a reset can be recognised
/// and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(Uuid);

impl ScanId {
    /// Generate a new scan id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the screen shows. Exactly one of these at any time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanState {
    /// Camera live, waiting for a decode
    #[default]
    Idle,

    /// Barcode captured, lookup in flight
    Resolving {
        /// Current scan
        scan_id: ScanId,
        /// Decoded text
        barcode: String,
        /// When the decode arrived
        started_at: DateTime<Utc>,
    },

    /// Ticket was sold and unused; entry may be approved
    Valid {
        /// Current scan
        scan_id: ScanId,
        /// Matched ticket
        ticket_id: TicketId,
        /// Ticket contents as read
        ticket: Ticket,
    },

    /// No usable ticket
    Invalid {
        /// Current scan
        scan_id: ScanId,
        /// Why
        message: String,
    },

    /// Ticket was already used
    AlreadyScanned {
        /// Current scan
        scan_id: ScanId,
        /// Matched ticket
        ticket_id: TicketId,
        /// Ticket contents
        ticket: Ticket,
    },
}

/// Outcome shown once a scan has resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanResult {
    /// Ticket accepted
    Valid,
    /// Ticket rejected
    Invalid,
    /// Ticket used before
    AlreadyScanned,
}

impl ScanResult {
    /// Metric label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::AlreadyScanned => "already_scanned",
        }
    }
}

/// Local state for one scan cycle.
///
/// Reset replaces it with `ScanSession::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanSession {
    pub(crate) state: ScanState,
}

impl ScanSession {
    /// A fresh session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session in the given state.
    #[must_use]
    pub const fn from_state(state: ScanState) -> Self {
        Self { state }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &ScanState {
        &self.state
    }

    /// Scan currently in flight or on display.
    #[must_use]
    pub const fn scan_id(&self) -> Option<ScanId> {
        match &self.state {
            ScanState::Idle => None,
            ScanState::Resolving { scan_id, .. }
            | ScanState::Valid { scan_id, .. }
            | ScanState::Invalid { scan_id, .. }
            | ScanState::AlreadyScanned { scan_id, .. } => Some(*scan_id),
        }
    }

    /// Whether a decode has been accepted this cycle.
    #[must_use]
    pub const fn barcode_scanned(&self) -> bool {
        !matches!(self.state, ScanState::Idle)
    }

    /// The resolved outcome, if any.
    #[must_use]
    pub const fn scan_result(&self) -> Option<ScanResult> {
        match self.state {
            ScanState::Idle | ScanState::Resolving { .. } => None,
            ScanState::Valid { .. } => Some(ScanResult::Valid),
            ScanState::Invalid { .. } => Some(ScanResult::Invalid),
            ScanState::AlreadyScanned { .. } => Some(ScanResult::AlreadyScanned),
        }
    }

    /// Whether the session shows a result and waits for a reset action.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.scan_result().is_some()
    }

    /// Document id of the matched ticket.
    #[must_use]
    pub const fn ticket_id(&self) -> Option<&TicketId> {
        match &self.state {
            ScanState::Valid { ticket_id, .. } | ScanState::AlreadyScanned { ticket_id, .. } => {
                Some(ticket_id)
            },
            _ => None,
        }
    }

    /// Contents of the matched ticket.
    #[must_use]
    pub const fn ticket_details(&self) -> Option<&Ticket> {
        match &self.state {
            ScanState::Valid { ticket, .. } | ScanState::AlreadyScanned { ticket, .. } => {
                Some(ticket)
            },
            _ => None,
        }
    }

    /// True only for a sold, unused ticket.
    #[must_use]
    pub const fn is_valid_ticket(&self) -> bool {
        matches!(self.state, ScanState::Valid { .. })
    }

    /// Reason shown for an invalid scan.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.state {
            ScanState::Invalid { message, .. } => Some(message),
            _ => None,
        }
    }
}
