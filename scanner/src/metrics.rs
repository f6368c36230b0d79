//! Scanner metrics.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `scanner_scans_total{result}` - Resolved scans by result
//! - `scanner_status_updates_total{outcome}` - Mark-as-scanned writes by outcome
//! - `scanner_entries_approved_total` - Entries approved after a valid scan

use metrics::describe_counter;

/// Counter: resolved scans, labelled by `result`
pub const SCANNER_SCANS_TOTAL: &str = "scanner_scans_total";

/// Counter: status-update writes, labelled by `outcome`
pub const SCANNER_STATUS_UPDATES_TOTAL: &str = "scanner_status_updates_total";

/// Counter: entries approved by the operator
pub const SCANNER_ENTRIES_APPROVED_TOTAL: &str = "scanner_entries_approved_total";

/// Register the scanner's metric descriptions.
///
/// Call once at startup, next to
/// [`ticket_scan_runtime::metrics::describe_metrics`].
pub fn register_scanner_metrics() {
    describe_counter!(
        SCANNER_SCANS_TOTAL,
        "Total number of resolved scans, by result (valid, invalid, already_scanned)"
    );
    describe_counter!(
        SCANNER_STATUS_UPDATES_TOTAL,
        "Total number of mark-as-scanned writes, by outcome (applied, conflict, failed)"
    );
    describe_counter!(
        SCANNER_ENTRIES_APPROVED_TOTAL,
        "Total number of entries approved after a valid scan"
    );

    tracing::debug!("Scanner metrics registered");
}
