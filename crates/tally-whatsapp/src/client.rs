// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Web bridge.
//!
//! The bridge owns the browser session. This client only posts documents
//! and reads session status. There are no retries here: a failed send stays
//! due and is picked up by the next dispatch pass.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use tally_core::{DeliveryError, DeliveryErrorKind, TallyError};

use crate::types::{
    BridgeErrorResponse, BridgeStatus, SendDocumentRequest, SendDocumentResponse,
};

#[derive(Debug, Clone)]
pub struct BridgeClient {
    client: reqwest::Client,
    base_url: String,
}

impl BridgeClient {
    /// Build a client for `base_url`, sending `token` as a bearer token when set.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, TallyError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                TallyError::Config(format!("invalid whatsapp.api_token header value: {e}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TallyError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send_document(
        &self,
        request: &SendDocumentRequest,
    ) -> Result<SendDocumentResponse, DeliveryError> {
        let response = self
            .client
            .post(format!("{}/send-document", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                DeliveryError::new(
                    DeliveryErrorKind::Transport,
                    format!("bridge request failed: {e}"),
                )
            })?;

        let status = response.status();
        debug!(status = %status, chat_id = %request.chat_id, "bridge replied");

        let body = response.text().await.map_err(|e| {
            DeliveryError::new(
                DeliveryErrorKind::Transport,
                format!("failed to read bridge response: {e}"),
            )
        })?;

        if status.is_success() {
            // An empty or non-JSON success body still means the send went out.
            return Ok(serde_json::from_str(&body)
                .unwrap_or(SendDocumentResponse { message_id: None }));
        }

        Err(classify_failure(status, &body))
    }

    pub async fn status(&self) -> Result<BridgeStatus, TallyError> {
        let response = self
            .client
            .get(format!("{}/status", self.base_url))
            .send()
            .await
            .map_err(|e| {
                TallyError::from(DeliveryError::new(
                    DeliveryErrorKind::Transport,
                    format!("bridge status request failed: {e}"),
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body).into());
        }

        response.json::<BridgeStatus>().await.map_err(|e| {
            TallyError::from(DeliveryError::new(
                DeliveryErrorKind::Transport,
                format!("invalid bridge status body: {e}"),
            ))
        })
    }
}

/// Map a non-2xx bridge reply to a delivery failure.
///
/// A recognised error code in the body wins over the HTTP status.
pub fn classify_failure(status: StatusCode, body: &str) -> DeliveryError {
    let parsed = serde_json::from_str::<BridgeErrorResponse>(body).ok();
    let from_code = parsed.as_ref().and_then(|e| kind_for_code(&e.error));

    let kind = from_code.unwrap_or(match status {
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::CONFLICT => {
            DeliveryErrorKind::ChannelNotReady
        }
        StatusCode::NOT_FOUND => DeliveryErrorKind::RecipientRejected,
        StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            DeliveryErrorKind::AttachmentRejected
        }
        _ => DeliveryErrorKind::Transport,
    });

    let message = match parsed {
        Some(BridgeErrorResponse {
            error,
            message: Some(message),
        }) => format!("bridge returned {status} ({error}): {message}"),
        Some(BridgeErrorResponse { error, message: None }) => {
            format!("bridge returned {status} ({error})")
        }
        None if body.is_empty() => format!("bridge returned {status}"),
        None => format!("bridge returned {status}: {body}"),
    };

    DeliveryError::new(kind, message)
}

fn kind_for_code(code: &str) -> Option<DeliveryErrorKind> {
    match code {
        "session_not_ready" | "not_authenticated" | "qr_pending" => {
            Some(DeliveryErrorKind::ChannelNotReady)
        }
        "invalid_recipient" | "not_on_whatsapp" => Some(DeliveryErrorKind::RecipientRejected),
        "invalid_attachment" | "media_rejected" => Some(DeliveryErrorKind::AttachmentRejected),
        _ => None,
    }
}
