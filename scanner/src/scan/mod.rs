//! The scan controller.
//!
//! One decode at a time moves through a small state machine:
//!
//! ```text
//! Idle ──decode──▶ Resolving ──lookup───▶ Valid ──────────▶ (mark as scanned)
//!  ▲                  │                   Invalid
//!  │                  │                   AlreadyScanned
//!  │                  └──timeout────────▶ Invalid
//!  └──────── Retry / Confirm / ApproveEntry ◀──┘
//! ```
//!
//! The session is a single tagged enum, so the screen always shows exactly
//! one of camera, valid card, invalid card or already-scanned card. The
//! mark-as-scanned write is an effect emitted once, at the `Resolving → Valid`
//! transition.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod state;
pub mod store;

pub use actions::ScanAction;
pub use environment::{DEFAULT_LOOKUP_TIMEOUT, ScanEnvironment};
pub use reducer::{NOT_VALID_FOR_ENTRY, ScanReducer};
pub use state::{ScanId, ScanResult, ScanSession, ScanState};
pub use store::{ScanRuntime, ScanStore};
