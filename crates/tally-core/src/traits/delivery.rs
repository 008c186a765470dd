// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery channel trait for sending invoice documents to clients.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InvoiceDocument, Recipient};

/// A messaging channel that can deliver a text plus one attached file.
///
/// Implementations may take several seconds per send. Every error is
/// considered retryable by the dispatcher.
#[async_trait]
pub trait DeliveryChannel: PluginAdapter {
    /// Send `text` with `document` attached to `recipient`.
    async fn send_document(
        &self,
        recipient: &Recipient,
        text: &str,
        document: &InvoiceDocument,
    ) -> Result<(), DeliveryError>;
}
