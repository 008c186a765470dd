// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use tally_config::model::GatewayConfig;
use tally_core::TallyError;
use tally_dispatch::RecurringDispatcher;
use tally_ledger::InvoiceLifecycle;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub lifecycle: Arc<InvoiceLifecycle>,
    pub dispatcher: RecurringDispatcher,
    pub auth: AuthConfig,
    /// Process start, for uptime on `/health`.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(
        lifecycle: Arc<InvoiceLifecycle>,
        dispatcher: RecurringDispatcher,
        bearer_token: Option<String>,
    ) -> Self {
        Self {
            lifecycle,
            dispatcher,
            auth: AuthConfig { bearer_token },
            start_time: Instant::now(),
        }
    }
}

/// Listener address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// All routes. `/health` is public; everything under `/v1` needs the bearer token.
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/invoices",
            get(handlers::list_invoices).post(handlers::create_invoice),
        )
        .route(
            "/v1/invoices/{id}",
            get(handlers::get_invoice)
                .put(handlers::update_invoice)
                .delete(handlers::delete_invoice),
        )
        .route(
            "/v1/invoices/{id}/paid",
            post(handlers::mark_paid).delete(handlers::mark_unpaid),
        )
        .route("/v1/invoices/{id}/auto-send", put(handlers::set_auto_send))
        .route(
            "/v1/invoices/{id}/profitability",
            get(handlers::get_profitability),
        )
        .route("/v1/invoices/{id}/expenses", post(handlers::add_expense))
        .route(
            "/v1/invoices/{id}/expenses/{expense_id}",
            delete(handlers::remove_expense),
        )
        .route("/v1/auto-send/due", get(handlers::list_due))
        .route("/v1/auto-send/run", post(handlers::run_dispatch))
        .route("/v1/auto-send/status", get(handlers::get_dispatch_status))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Serve the gateway until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), TallyError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TallyError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| TallyError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
