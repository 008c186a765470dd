// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tally serve`: run the dispatch timer and the HTTP gateway until signalled.

use std::time::Duration;

use tracing::{error, info, warn};

use tally_config::TallyConfig;
use tally_core::{HealthStatus, PluginAdapter, TallyError};
use tally_gateway::{GatewayState, ServerConfig, start_server};

use crate::shutdown;
use crate::wiring::build_services;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run_serve(config: TallyConfig) -> Result<(), TallyError> {
    info!(name = %config.app.name, "starting tally serve");

    let services = build_services(&config).await?;

    match services.channel.health_check().await {
        Ok(HealthStatus::Healthy) => info!("whatsapp bridge ready"),
        Ok(HealthStatus::Degraded(reason)) | Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(%reason, "whatsapp bridge not ready, sends will fail until it is");
        }
        Err(e) => warn!(error = %e, "whatsapp bridge health check failed"),
    }

    let cancel = shutdown::install_signal_handler();

    if config.dispatch.enabled {
        services.dispatcher.start().await;
    } else {
        info!("dispatch timer disabled by configuration");
    }

    let gateway = if config.gateway.enabled {
        let state = GatewayState::new(
            services.lifecycle.clone(),
            services.dispatcher.clone(),
            config.gateway.bearer_token.clone(),
        );
        let server_config = ServerConfig::from(&config.gateway);
        let gateway_cancel = cancel.child_token();
        let shutdown_all = cancel.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = start_server(&server_config, state, gateway_cancel).await {
                error!(error = %e, "gateway failed");
                shutdown_all.cancel();
            }
        }))
    } else {
        None
    };

    cancel.cancelled().await;

    services.dispatcher.stop().await;
    shutdown::drain_pass(&services.dispatcher, DRAIN_TIMEOUT).await;

    if let Some(handle) = gateway
        && let Err(e) = handle.await
    {
        warn!(error = %e, "gateway task ended abnormally");
    }

    if let Err(e) = services.store.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }

    info!("tally serve shutdown complete");
    Ok(())
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tally={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
