//! # Ticket Scan Firestore
//!
//! A small client for the Firestore REST API.
//!
//! Only the calls the scanner needs are covered:
//!
//! - **Equality query**: `runQuery` over one collection with a single
//!   `fieldFilter` (`EQUAL`)
//! - **Field update**: `PATCH` with an update mask so untouched fields are
//!   preserved, optionally guarded by a `currentDocument` precondition
//!
//! Documents carry their fields in Firestore's typed encoding ([`Value`]);
//! [`Document::decode`] turns them into any `serde` type.
//!
//! ## Example
//!
//! ```no_run
//! use ticket_scan_firestore::{FirestoreClient, Value};
//!
//! # async fn example() -> Result<(), ticket_scan_firestore::FirestoreError> {
//! let client = FirestoreClient::new("my-project").with_api_key("AIza...");
//!
//! let docs = client
//!     .query_equal(
//!         "organiser/org-1/events/evt-1",
//!         "tickets",
//!         "ticketBarcode",
//!         Value::string("ABC123"),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod document;
pub mod error;
pub mod value;

// Re-exports
pub use client::{DEFAULT_BASE_URL, DEFAULT_DATABASE, FirestoreClient};
pub use document::{Document, Precondition};
pub use error::FirestoreError;
pub use value::Value;
