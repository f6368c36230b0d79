//! Environment for the scan reducer.

use crate::camera::ScannerSettings;
use crate::lookup::{SharedTicketStore, TicketLookupClient};
use crate::types::EventScope;
use std::sync::Arc;
use std::time::Duration;
use ticket_scan_core::environment::Clock;

/// Default time to wait for a lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Dependencies of the scan reducer.
///
/// Cloning is cheap: the clock and the store are shared.
#[derive(Clone)]
pub struct ScanEnvironment {
    clock: Arc<dyn Clock>,
    lookup: TicketLookupClient<SharedTicketStore>,
    scope: EventScope,
    settings: ScannerSettings,
    lookup_timeout: Duration,
}

impl ScanEnvironment {
    /// Create an environment scanning tickets of `scope`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, store: SharedTicketStore, scope: EventScope) -> Self {
        Self {
            clock,
            lookup: TicketLookupClient::new(store),
            scope,
            settings: ScannerSettings::default(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Use other camera settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: ScannerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use another lookup timeout.
    #[must_use]
    pub const fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Clock for timestamps.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Lookup client.
    #[must_use]
    pub const fn lookup(&self) -> &TicketLookupClient<SharedTicketStore> {
        &self.lookup
    }

    /// Event being scanned.
    #[must_use]
    pub const fn scope(&self) -> &EventScope {
        &self.scope
    }

    /// Camera settings.
    #[must_use]
    pub const fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    /// How long a lookup may take before the scan is failed.
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }
}

impl std::fmt::Debug for ScanEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEnvironment")
            .field("scope", &self.scope)
            .field("settings", &self.settings)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}
