//! Store metric descriptions.
//!
//! The store records counters through the `metrics` facade.
//! Nothing is exported unless the host application installs a recorder;
//! [`describe_metrics`] registers the descriptions so that any recorder
//! installed later can render help text.
//!
//! # Example
//!
//! ```rust,no_run
//! ticket_scan_runtime::metrics::describe_metrics();
//! ```

use metrics::describe_counter;

/// Counter: actions sent to a store
pub const STORE_ACTIONS_TOTAL: &str = "store.actions.total";

/// Counter: effects executed by a store, labelled by `type`
pub const STORE_EFFECTS_EXECUTED: &str = "store.effects.executed";

/// Register the store's metric descriptions.
pub fn describe_metrics() {
    // Store Metrics
    describe_counter!(STORE_ACTIONS_TOTAL, "Total number of actions sent to a store");
    describe_counter!(
        STORE_EFFECTS_EXECUTED,
        "Total number of effects executed, by effect type"
    );
}
