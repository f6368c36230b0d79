//! # Ticket Scan
//!
//! Headless controller for a ticket-scanning screen.
//!
//! A camera decodes a barcode, the controller looks the ticket up in the
//! event's ticket collection, shows whether it is valid, and marks a valid
//! ticket as scanned so it cannot be used twice.
//!
//! ## Architecture
//!
//! ```text
//! camera decode ─▶ ScanStore ─▶ ScanReducer ─▶ lookup effect ─▶ TicketLookupClient
//!                     ▲                                              │
//!                     └──────────── LookupCompleted ◀────────────────┘
//!                     │
//!                     └──▶ ScanView (what the shell renders)
//! ```
//!
//! The remote store sits behind [`lookup::TicketStore`]:
//! [`lookup::FirestoreTicketStore`] in production,
//! [`mocks::InMemoryTicketStore`] in tests.

pub mod camera;
pub mod config;
pub mod lookup;
pub mod metrics;
pub mod mocks;
pub mod scan;
pub mod types;
pub mod view;

pub use camera::{BarcodeFormat, RectOfInterest, ScannerSettings};
pub use config::{Config, ConfigError};
pub use lookup::{
    FirestoreTicketStore, LookupVerdict, StatusUpdateOutcome, TicketLookupClient, TicketStore,
    TicketStoreError,
};
pub use scan::{ScanAction, ScanEnvironment, ScanReducer, ScanSession, ScanState, ScanStore};
pub use types::{EventId, EventScope, OrganiserId, Ticket, TicketId, TicketStatus};
pub use view::{Affordance, ScanView};
