// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Tally.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// The primary error type used across all Tally adapter traits and core operations.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The referenced invoice does not exist.
    #[error("invoice not found: {id}")]
    NotFound { id: String },

    /// The invoice has no usable phone number on file.
    #[error("invoice #{invoice_number} has no recipient phone number")]
    MissingRecipient { invoice_number: i64 },

    /// No rendered document exists for the invoice number.
    #[error("no document found for invoice #{invoice_number}")]
    DocumentNotFound { invoice_number: i64 },

    /// The delivery channel refused or failed to send.
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Creating the successor invoice after a payment failed.
    #[error("failed to duplicate invoice {source_id}: {message}")]
    Duplication { source_id: String, message: String },

    /// Caller-supplied data is invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TallyError {
    /// Shorthand for [`TallyError::NotFound`].
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Whether this error concerns a single invoice rather than the dispatch harness.
    pub fn is_per_invoice(&self) -> bool {
        matches!(
            self,
            Self::MissingRecipient { .. } | Self::DocumentNotFound { .. } | Self::Delivery(_)
        )
    }
}

/// Why a delivery channel rejected a send.
///
/// Every kind is treated as retryable on the next dispatch pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// The messaging session is not connected or not yet authenticated.
    ChannelNotReady,
    /// The recipient identifier is not registered on the messaging network.
    RecipientRejected,
    /// The attachment could not be read or was refused.
    AttachmentRejected,
    /// Network or protocol failure talking to the channel.
    Transport,
}

/// Error returned by [`DeliveryChannel`](crate::traits::DeliveryChannel) sends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct DeliveryError {
    pub kind: DeliveryErrorKind,
    pub message: String,
}

impl DeliveryError {
    pub fn new(kind: DeliveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
