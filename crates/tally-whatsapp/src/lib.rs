// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp delivery channel for Tally.
//!
//! [`WhatsAppBridgeChannel`] hands invoice documents to a WhatsApp Web bridge
//! process over HTTP. Session management and QR pairing live in the bridge.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use tally_config::model::WhatsAppConfig;
use tally_core::{
    AdapterType, DeliveryChannel, DeliveryError, DeliveryErrorKind, HealthStatus, InvoiceDocument,
    PluginAdapter, Recipient, TallyError,
};

use crate::client::BridgeClient;
use crate::types::SendDocumentRequest;

pub use client::classify_failure;

/// WhatsApp chat id for a normalized phone number.
pub fn chat_id(recipient: &Recipient) -> String {
    format!("{}@c.us", recipient.0)
}

/// Delivery channel backed by a WhatsApp Web bridge.
pub struct WhatsAppBridgeChannel {
    client: BridgeClient,
}

impl WhatsAppBridgeChannel {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, TallyError> {
        let client = BridgeClient::new(
            &config.bridge_url,
            config.api_token.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(bridge_url = %client.base_url(), "whatsapp channel initialized");
        Ok(Self { client })
    }

    async fn encode_document(document: &InvoiceDocument) -> Result<String, DeliveryError> {
        let bytes = tokio::fs::read(&document.path).await.map_err(|e| {
            DeliveryError::new(
                DeliveryErrorKind::AttachmentRejected,
                format!("cannot read {}: {e}", document.path.display()),
            )
        })?;
        Ok(STANDARD.encode(bytes))
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppBridgeChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TallyError> {
        match self.client.status().await {
            Ok(status) if status.ready => Ok(HealthStatus::Healthy),
            Ok(status) => Ok(HealthStatus::Degraded(format!(
                "session not ready: {}",
                status.state.as_deref().unwrap_or("unknown")
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), TallyError> {
        Ok(())
    }
}

#[async_trait]
impl DeliveryChannel for WhatsAppBridgeChannel {
    async fn send_document(
        &self,
        recipient: &Recipient,
        text: &str,
        document: &InvoiceDocument,
    ) -> Result<(), DeliveryError> {
        let request = SendDocumentRequest {
            chat_id: chat_id(recipient),
            caption: text.to_string(),
            file_name: document.file_name.clone(),
            mime_type: document.mime_type.clone(),
            data: Self::encode_document(document).await?,
        };

        let response = self.client.send_document(&request).await?;
        debug!(
            chat_id = %request.chat_id,
            file_name = %request.file_name,
            message_id = ?response.message_id,
            "document delivered to bridge"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str) -> WhatsAppConfig {
        WhatsAppConfig {
            bridge_url: url.to_string(),
            api_token: Some("bridge-secret".into()),
            timeout_secs: 5,
        }
    }

    fn write_document(dir: &tempfile::TempDir) -> InvoiceDocument {
        let path = dir.path().join("invoice_17.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();
        InvoiceDocument::pdf(path)
    }

    #[test]
    fn chat_id_uses_c_us_suffix() {
        assert_eq!(chat_id(&Recipient("79161234567".into())), "79161234567@c.us");
    }

    #[tokio::test]
    async fn posts_base64_document_with_token() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let document = write_document(&dir);

        Mock::given(method("POST"))
            .and(path("/send-document"))
            .and(header("authorization", "Bearer bridge-secret"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "79161234567@c.us",
                "caption": "Invoice No. 17",
                "file_name": "invoice_17.pdf",
                "mime_type": "application/pdf",
                "data": STANDARD.encode(b"%PDF-1.4 test"),
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message_id": "m1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppBridgeChannel::new(&config(&server.uri())).unwrap();
        channel
            .send_document(&Recipient("79161234567".into()), "Invoice No. 17", &document)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn not_ready_session_maps_to_channel_not_ready() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let document = write_document(&dir);

        Mock::given(method("POST"))
            .and(path("/send-document"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error": "qr_pending",
                "message": "scan the QR code"
            })))
            .mount(&server)
            .await;

        let channel = WhatsAppBridgeChannel::new(&config(&server.uri())).unwrap();
        let err = channel
            .send_document(&Recipient("7916".into()), "hi", &document)
            .await
            .unwrap_err();
        assert_eq!(err.kind, DeliveryErrorKind::ChannelNotReady);
        assert!(err.message.contains("scan the QR code"));
    }

    #[tokio::test]
    async fn missing_file_is_attachment_rejected_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let channel = WhatsAppBridgeChannel::new(&config(&server.uri())).unwrap();
        let document = InvoiceDocument::pdf(PathBuf::from("/nonexistent/invoice_1.pdf"));
        let err = channel
            .send_document(&Recipient("7916".into()), "hi", &document)
            .await
            .unwrap_err();
        assert_eq!(err.kind, DeliveryErrorKind::AttachmentRejected);
    }

    #[tokio::test]
    async fn unreachable_bridge_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let document = write_document(&dir);
        // Port 9 (discard) is closed on test hosts.
        let channel = WhatsAppBridgeChannel::new(&config("http://127.0.0.1:9")).unwrap();
        let err = channel
            .send_document(&Recipient("7916".into()), "hi", &document)
            .await
            .unwrap_err();
        assert_eq!(err.kind, DeliveryErrorKind::Transport);
    }

    #[tokio::test]
    async fn health_check_reflects_session_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ready": false,
                "state": "qr_pending"
            })))
            .mount(&server)
            .await;

        let channel = WhatsAppBridgeChannel::new(&config(&server.uri())).unwrap();
        let health = channel.health_check().await.unwrap();
        assert_eq!(health, HealthStatus::Degraded("session not ready: qr_pending".into()));
    }

    #[tokio::test]
    async fn health_check_ready_is_healthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ready": true})))
            .mount(&server)
            .await;

        let channel = WhatsAppBridgeChannel::new(&config(&server.uri())).unwrap();
        assert_eq!(channel.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
