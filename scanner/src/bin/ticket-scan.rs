//! Terminal ticket scanner
//!
//! Stands in for the camera: every line read from stdin is treated as a
//! decoded barcode in the configured format. The current screen is printed
//! after each step.
//!
//! Commands:
//! - `retry`, `confirm`, `approve`: press the button on the result card
//! - `quit`: exit
//!
//! # Usage
//!
//! ```bash
//! export SCANNER_ORGANISER_ID=org-1 SCANNER_EVENT_ID=evt-1 FIRESTORE_PROJECT_ID=my-project
//! cargo run --bin ticket-scan
//! ```

use std::sync::Arc;
use std::time::Duration;
use ticket_scan::{
    Config, FirestoreTicketStore, ScanAction, ScanEnvironment, ScanStore, ScanView,
};
use ticket_scan_core::environment::SystemClock;
use ticket_scan_firestore::FirestoreClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ticket_scan=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    ticket_scan_runtime::metrics::describe_metrics();
    ticket_scan::metrics::register_scanner_metrics();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        scope = %config.scope,
        project = %config.firestore.project_id,
        format = %config.scanner.barcode_format,
        "Configuration loaded"
    );

    let lookup_timeout = config.scanner.lookup_timeout();
    let settings = config.scanner.settings();

    // Setup document store
    let mut client = FirestoreClient::new(&config.firestore.project_id)
        .with_base_url(&config.firestore.base_url)
        .with_database(&config.firestore.database)
        .with_request_timeout(lookup_timeout)?;
    if let Some(key) = &config.firestore.api_key {
        client = client.with_api_key(key);
    }

    let environment = ScanEnvironment::new(
        Arc::new(SystemClock),
        Arc::new(FirestoreTicketStore::new(client)),
        config.scope.clone(),
    )
    .with_settings(settings)
    .with_lookup_timeout(lookup_timeout);
    let store = ScanStore::new(environment);

    info!(rect_of_interest = ?settings.rect_of_interest, "Scanner ready");
    println!("{}", store.view().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let action = match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "retry" => ScanAction::Retry,
            "confirm" => ScanAction::Confirm,
            "approve" => ScanAction::ApproveEntry,
            barcode => ScanAction::BarcodeDecoded {
                data: barcode.to_string(),
                format: settings.format,
            },
        };

        let decoding = matches!(action, ScanAction::BarcodeDecoded { .. });
        store.dispatch(action).await?;

        if decoding {
            let view = store.view().await;
            if matches!(view, ScanView::Checking { .. }) {
                println!("{view}");
                // The lookup timeout always resolves the scan
                store
                    .wait_for_result(lookup_timeout.saturating_add(Duration::from_secs(1)))
                    .await?;
            }
        }

        println!("{}", store.view().await);
    }

    info!("Shutting down");
    if let Err(error) = store.shutdown(Duration::from_secs(2)).await {
        // A mark-as-scanned write may still be in flight
        warn!(%error, "Exiting with effects still running");
    }

    Ok(())
}
