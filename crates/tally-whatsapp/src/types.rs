// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the WhatsApp Web bridge.

use serde::{Deserialize, Serialize};

/// Body of `POST /send-document`.
#[derive(Debug, Clone, Serialize)]
pub struct SendDocumentRequest {
    /// `<digits>@c.us`.
    pub chat_id: String,
    pub caption: String,
    pub file_name: String,
    pub mime_type: String,
    /// Base64-encoded file contents.
    pub data: String,
}

/// Successful reply to `POST /send-document`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendDocumentResponse {
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Error body returned by the bridge on non-2xx replies.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeErrorResponse {
    /// Machine-readable code such as `session_not_ready`.
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to `GET /status`.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeStatus {
    pub ready: bool,
    /// Session state as reported by the bridge, e.g. `qr_pending`.
    #[serde(default)]
    pub state: Option<String>,
}
