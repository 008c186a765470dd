// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the `/v1` API and the public health check.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{Clock, Invoice, InvoiceDraft, InvoiceId};
use tally_dispatch::DispatchStatus;
use tally_ledger::{CreateOutcome, ExpenseDraft, PaymentOutcome, Profitability};

use crate::error::ApiError;
use crate::server::GatewayState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Body of `PUT /v1/invoices/{id}/auto-send`.
#[derive(Debug, Deserialize)]
pub struct AutoSendRequest {
    pub enabled: bool,
    /// Replaces the stored date when present.
    #[serde(default)]
    pub next_send_date: Option<DateTime<Utc>>,
}

/// Reply to `POST /v1/auto-send/run`.
#[derive(Debug, Serialize)]
pub struct RunResponse {
    /// `false` when a pass was already in flight.
    pub started: bool,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

pub async fn list_invoices(State(state): State<GatewayState>) -> ApiResult<Json<Vec<Invoice>>> {
    Ok(Json(state.lifecycle.list_invoices().await?))
}

pub async fn create_invoice(
    State(state): State<GatewayState>,
    Json(draft): Json<InvoiceDraft>,
) -> ApiResult<(StatusCode, Json<CreateOutcome>)> {
    let outcome = state.lifecycle.create_invoice(draft).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn get_invoice(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(state.lifecycle.get_invoice(&InvoiceId(id)).await?))
}

pub async fn update_invoice(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(draft): Json<InvoiceDraft>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(
        state.lifecycle.update_invoice(&InvoiceId(id), draft).await?,
    ))
}

pub async fn delete_invoice(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.lifecycle.delete_invoice(&InvoiceId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/invoices/{id}/paid
///
/// A failed duplication comes back in `warning`; the payment itself stands.
pub async fn mark_paid(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PaymentOutcome>> {
    Ok(Json(state.lifecycle.mark_paid(&InvoiceId(id)).await?))
}

pub async fn mark_unpaid(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(state.lifecycle.mark_unpaid(&InvoiceId(id)).await?))
}

pub async fn set_auto_send(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<AutoSendRequest>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(
        state
            .lifecycle
            .set_auto_send(&InvoiceId(id), body.enabled, body.next_send_date)
            .await?,
    ))
}

pub async fn get_profitability(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Profitability>> {
    Ok(Json(state.lifecycle.profitability(&InvoiceId(id)).await?))
}

pub async fn add_expense(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(draft): Json<ExpenseDraft>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    let invoice = state.lifecycle.add_expense(&InvoiceId(id), draft).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn remove_expense(
    State(state): State<GatewayState>,
    Path((id, expense_id)): Path<(String, String)>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(
        state
            .lifecycle
            .remove_expense(&InvoiceId(id), &expense_id)
            .await?,
    ))
}

/// GET /v1/auto-send/due
pub async fn list_due(State(state): State<GatewayState>) -> ApiResult<Json<Vec<Invoice>>> {
    let now = state.lifecycle.clock().now();
    Ok(Json(state.lifecycle.due_for_auto_send(now).await?))
}

/// POST /v1/auto-send/run
///
/// Starts a pass in the background. 409 when one is already running.
pub async fn run_dispatch(State(state): State<GatewayState>) -> (StatusCode, Json<RunResponse>) {
    if state.dispatcher.trigger_now() {
        tracing::info!("manual dispatch pass started");
        (StatusCode::ACCEPTED, Json(RunResponse { started: true }))
    } else {
        (StatusCode::CONFLICT, Json(RunResponse { started: false }))
    }
}

pub async fn get_dispatch_status(
    State(state): State<GatewayState>,
) -> ApiResult<Json<DispatchStatus>> {
    Ok(Json(state.dispatcher.status().await?))
}
