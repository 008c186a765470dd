// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling and draining of the in-flight dispatch pass.

use std::time::Duration;

use tally_dispatch::RecurringDispatcher;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Cancel the returned token on SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT, shutting down"),
                        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, shutting down");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Wait up to `timeout` for a running dispatch pass to finish.
///
/// A pass cut short leaves unsent invoices due; they go out on the next start.
pub async fn drain_pass(dispatcher: &RecurringDispatcher, timeout: Duration) {
    if !dispatcher.is_pass_running() {
        debug!("no dispatch pass in flight");
        return;
    }

    info!(timeout_secs = timeout.as_secs(), "waiting for dispatch pass to finish");
    let wait = async {
        while dispatcher.is_pass_running() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    };

    if tokio::time::timeout(timeout, wait).await.is_ok() {
        info!("dispatch pass finished");
    } else {
        warn!("dispatch pass still running at shutdown, remaining invoices stay due");
    }
}
