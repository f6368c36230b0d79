//! Store for the scan controller.

use crate::camera::BarcodeFormat;
use crate::scan::{ScanAction, ScanEnvironment, ScanReducer, ScanSession};
use crate::view::ScanView;
use std::time::Duration;
use ticket_scan_runtime::{EffectHandle, Store, StoreError};
use tokio::sync::broadcast;

/// The runtime store specialised for scanning
pub type ScanRuntime = Store<ScanSession, ScanAction, ScanEnvironment, ScanReducer>;

/// Store driving one scanner screen.
///
/// Wraps the runtime [`Store`] with the operations a UI shell needs: feed a
/// decode, press a button, read what to render.
#[derive(Clone)]
pub struct ScanStore {
    store: ScanRuntime,
}

impl ScanStore {
    /// Create a store with a fresh session.
    #[must_use]
    pub fn new(environment: ScanEnvironment) -> Self {
        Self {
            store: Store::new(ScanSession::default(), ScanReducer::new(), environment),
        }
    }

    /// Dispatch an action.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`ScanStore::shutdown`].
    pub async fn dispatch(&self, action: ScanAction) -> Result<EffectHandle, StoreError> {
        self.store.send(action).await
    }

    /// Feed a decode event from the camera.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`ScanStore::shutdown`].
    pub async fn decode(
        &self,
        data: impl Into<String>,
        format: BarcodeFormat,
    ) -> Result<EffectHandle, StoreError> {
        self.dispatch(ScanAction::BarcodeDecoded {
            data: data.into(),
            format,
        })
        .await
    }

    /// Get a snapshot of the current session.
    pub async fn session(&self) -> ScanSession {
        self.store.state(ScanSession::clone).await
    }

    /// What the screen should show right now.
    pub async fn view(&self) -> ScanView {
        self.store.state(ScanView::from_session).await
    }

    /// Subscribe to actions produced by effects.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<ScanAction> {
        self.store.subscribe_actions()
    }

    /// Wait until the session shows a result, then return it.
    ///
    /// Returns immediately if a result is already on screen.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if nothing resolves within `timeout`
    /// - [`StoreError::ChannelClosed`] if the store went away
    pub async fn wait_for_result(&self, timeout: Duration) -> Result<ScanSession, StoreError> {
        // Subscribe before reading state so a result can't slip in between
        let mut actions = self.subscribe_actions();

        tokio::time::timeout(timeout, async {
            loop {
                let session = self.session().await;
                if session.is_terminal() {
                    return Ok(session);
                }
                match actions.recv().await {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {},
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Stop accepting actions and wait for running effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects outlive `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}
