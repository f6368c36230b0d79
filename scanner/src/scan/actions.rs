//! Actions for the scan controller.

use crate::camera::BarcodeFormat;
use crate::lookup::{LookupVerdict, StatusUpdateOutcome};
use crate::scan::state::ScanId;
use crate::types::TicketId;

/// Inputs to the [`ScanReducer`](crate::scan::ScanReducer).
///
/// Decodes and the three buttons come from outside; the rest are fed back
/// by effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAction {
    /// The camera decoded a barcode.
    BarcodeDecoded {
        /// Raw decoded text
        data: String,
        /// Symbology reported by the decoder
        format: BarcodeFormat,
    },

    /// The ticket lookup for a scan finished.
    LookupCompleted {
        /// Scan the lookup belongs to
        scan_id: ScanId,
        /// What the lookup found
        verdict: LookupVerdict,
    },

    /// The lookup for a scan took too long.
    LookupTimedOut {
        /// Scan that timed out
        scan_id: ScanId,
    },

    /// The mark-as-scanned write finished.
    StatusUpdateFinished {
        /// Scan that issued the write
        scan_id: ScanId,
        /// Ticket written
        ticket_id: TicketId,
        /// How it went
        outcome: StatusUpdateOutcome,
    },

    /// Dismiss an invalid result.
    Retry,

    /// Dismiss an already-scanned result.
    Confirm,

    /// Let the holder of a valid ticket in.
    ApproveEntry,
}
