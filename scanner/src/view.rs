//! What a UI shell renders for each session state.
//!
//! The view is derived from the session and never stored, so rendering as
//! often as the shell likes has no effect on the scan itself.

use crate::scan::{ScanAction, ScanSession, ScanState};
use crate::types::Ticket;
use std::fmt;

/// Button shown on a result card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    /// On a valid ticket
    ApproveEntry,
    /// On an invalid ticket
    Retry,
    /// On an already-used ticket
    Confirm,
}

impl Affordance {
    /// Button label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ApproveEntry => "Approve Entry",
            Self::Retry => "Retry",
            Self::Confirm => "Confirm",
        }
    }

    /// Action dispatched when the button is pressed
    #[must_use]
    pub const fn action(self) -> ScanAction {
        match self {
            Self::ApproveEntry => ScanAction::ApproveEntry,
            Self::Retry => ScanAction::Retry,
            Self::Confirm => ScanAction::Confirm,
        }
    }
}

/// Card shown once a scan has resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    /// Status banner (`VALID`, `Failure`, `INVALID`)
    pub banner: &'static str,
    /// Card heading
    pub title: &'static str,
    /// Explanation line, if any
    pub message: Option<String>,
    /// Ticket detail lines
    pub details: Vec<String>,
    /// The one button on the card
    pub affordance: Affordance,
}

/// Screen contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanView {
    /// Camera preview, waiting for a barcode
    Camera,
    /// Barcode captured, lookup running
    Checking {
        /// Decoded text
        barcode: String,
    },
    /// Resolved scan
    Result(ResultCard),
}

impl ScanView {
    /// Derive the view for `session`.
    #[must_use]
    pub fn from_session(session: &ScanSession) -> Self {
        match session.state() {
            ScanState::Idle => Self::Camera,
            ScanState::Resolving { barcode, .. } => Self::Checking {
                barcode: barcode.clone(),
            },
            ScanState::Valid { ticket, .. } => Self::Result(ResultCard {
                banner: "VALID",
                title: "SCANNED!",
                message: None,
                details: detail_lines(ticket),
                affordance: Affordance::ApproveEntry,
            }),
            ScanState::Invalid { message, .. } => Self::Result(ResultCard {
                banner: "Failure",
                title: "INVALID TICKET",
                message: Some(message.clone()),
                details: Vec::new(),
                affordance: Affordance::Retry,
            }),
            ScanState::AlreadyScanned { .. } => Self::Result(ResultCard {
                banner: "INVALID",
                title: "INVALID",
                message: Some("Ticket has already been used".to_string()),
                details: Vec::new(),
                affordance: Affordance::Confirm,
            }),
        }
    }

    /// Button currently on screen.
    #[must_use]
    pub const fn affordance(&self) -> Option<Affordance> {
        match self {
            Self::Result(card) => Some(card.affordance),
            Self::Camera | Self::Checking { .. } => None,
        }
    }

    /// Whether the camera preview is live.
    #[must_use]
    pub const fn camera_active(&self) -> bool {
        matches!(self, Self::Camera)
    }
}

impl fmt::Display for ScanView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera => write!(f, "Scan a ticket barcode"),
            Self::Checking { barcode } => write!(f, "Checking {barcode}..."),
            Self::Result(card) => {
                writeln!(f, "[{}]", card.banner)?;
                writeln!(f, "{}", card.title)?;
                if let Some(message) = &card.message {
                    writeln!(f, "{message}")?;
                }
                for line in &card.details {
                    writeln!(f, "{line}")?;
                }
                write!(f, "<{}>", card.affordance.label())
            },
        }
    }
}

fn detail_lines(ticket: &Ticket) -> Vec<String> {
    let mut lines = Vec::with_capacity(4);
    if let Some(owner) = &ticket.owned_by {
        lines.push(format!("Owned By: {}", display_json(owner)));
    }
    if let Some(ticket_type) = &ticket.ticket_type {
        lines.push(format!("Type: {}", display_json(ticket_type)));
    }
    if let Some(price) = &ticket.price {
        lines.push(format!("Price: {}", display_json(price)));
    }
    if let Some(number) = &ticket.ticket_number {
        lines.push(format!("Ticket Number: {}", display_json(number)));
    }
    lines
}

/// Strings without quotes, everything else as JSON
fn display_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
