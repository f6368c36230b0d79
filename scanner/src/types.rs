//! Domain types for the ticket scanner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the organiser that owns an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganiserId(String);

impl OrganiserId {
    /// Wrap an organiser id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganiserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an event under an organiser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wrap an event id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document id of a ticket record.
///
/// Assigned by the document store when the ticket is created. This is not the
/// barcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wrap a ticket document id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The event whose tickets are being scanned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventScope {
    /// Organiser owning the event
    pub organiser_id: OrganiserId,
    /// Event being scanned
    pub event_id: EventId,
}

impl EventScope {
    /// Name of the ticket collection under an event.
    pub const TICKETS_COLLECTION: &'static str = "tickets";

    /// Create a scope.
    #[must_use]
    pub const fn new(organiser_id: OrganiserId, event_id: EventId) -> Self {
        Self {
            organiser_id,
            event_id,
        }
    }

    /// Path of the event document: `organiser/{orgId}/events/{eventId}`.
    #[must_use]
    pub fn event_path(&self) -> String {
        format!("organiser/{}/events/{}", self.organiser_id, self.event_id)
    }

    /// Path of one ticket document:
    /// `organiser/{orgId}/events/{eventId}/tickets/{ticketId}`.
    #[must_use]
    pub fn ticket_path(&self, ticket_id: &TicketId) -> String {
        format!(
            "{}/{}/{}",
            self.event_path(),
            Self::TICKETS_COLLECTION,
            ticket_id
        )
    }
}

impl fmt::Display for EventScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organiser_id, self.event_id)
    }
}

/// Consumption status of a ticket.
///
/// Only `sold → scanned` is ever written by the scanner. Values the scanner
/// does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketStatus {
    /// Paid for and not yet used
    Sold,
    /// Already used for entry
    Scanned,
    /// Any other value found in the store
    Other(String),
}

impl TicketStatus {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sold => "sold",
            Self::Scanned => "scanned",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TicketStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "sold" => Self::Sold,
            "scanned" => Self::Scanned,
            _ => Self::Other(raw),
        }
    }
}

impl From<TicketStatus> for String {
    fn from(status: TicketStatus) -> Self {
        match status {
            TicketStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ticket record as stored remotely.
///
/// Display fields are opaque and kept as raw JSON: `price` may be an integer
/// or a float, `ticketNumber` a string or an integer, and nothing stops
/// `ownedBy` or `type` from holding a number either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Barcode printed on the ticket; unique within an event
    pub ticket_barcode: String,

    /// Consumption status
    pub status: TicketStatus,

    /// Name of the ticket holder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<serde_json::Value>,

    /// Ticket category (e.g. "VIP", "General")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<serde_json::Value>,

    /// Price paid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<serde_json::Value>,

    /// Human-facing ticket number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<serde_json::Value>,
}

impl Ticket {
    /// A ticket with the given barcode and status and no display fields.
    #[must_use]
    pub fn new(ticket_barcode: impl Into<String>, status: TicketStatus) -> Self {
        Self {
            ticket_barcode: ticket_barcode.into(),
            status,
            owned_by: None,
            ticket_type: None,
            price: None,
            ticket_number: None,
        }
    }

    /// Set the holder name.
    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<serde_json::Value>) -> Self {
        self.owned_by = Some(owner.into());
        self
    }

    /// Set the ticket category.
    #[must_use]
    pub fn ticket_type(mut self, ticket_type: impl Into<serde_json::Value>) -> Self {
        self.ticket_type = Some(ticket_type.into());
        self
    }

    /// Set the price.
    #[must_use]
    pub fn price(mut self, price: impl Into<serde_json::Value>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Set the ticket number.
    #[must_use]
    pub fn ticket_number(mut self, number: impl Into<serde_json::Value>) -> Self {
        self.ticket_number = Some(number.into());
        self
    }
}
