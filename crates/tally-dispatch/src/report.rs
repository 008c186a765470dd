// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pass results and scheduler status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use tally_core::{DeliveryErrorKind, InvoiceId, TallyError};

/// Why one invoice was not delivered during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingRecipient,
    DocumentNotFound,
    ChannelNotReady,
    RecipientRejected,
    AttachmentRejected,
    Transport,
    /// Anything else: document lookup I/O, or storing the advanced date.
    Internal,
}

impl From<&TallyError> for FailureKind {
    fn from(err: &TallyError) -> Self {
        match err {
            TallyError::MissingRecipient { .. } => Self::MissingRecipient,
            TallyError::DocumentNotFound { .. } => Self::DocumentNotFound,
            TallyError::Delivery(e) => match e.kind {
                DeliveryErrorKind::ChannelNotReady => Self::ChannelNotReady,
                DeliveryErrorKind::RecipientRejected => Self::RecipientRejected,
                DeliveryErrorKind::AttachmentRejected => Self::AttachmentRejected,
                DeliveryErrorKind::Transport => Self::Transport,
            },
            _ => Self::Internal,
        }
    }
}

/// An invoice delivered during a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentInvoice {
    pub invoice_id: InvoiceId,
    pub invoice_number: i64,
    /// The date after advancing by one month.
    pub next_send_date: Option<DateTime<Utc>>,
}

/// An invoice skipped or failed during a pass. It keeps its date and is
/// retried on a later pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchFailure {
    pub invoice_id: InvoiceId,
    pub invoice_number: i64,
    pub kind: FailureKind,
    pub message: String,
}

/// Summary of one completed pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Size of the due set found at the start of the pass.
    pub due: usize,
    pub sent: Vec<SentInvoice>,
    pub failures: Vec<DispatchFailure>,
}

impl PassReport {
    pub(crate) fn empty(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            finished_at: now,
            due: 0,
            sent: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// What a call to `run_pass` did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassOutcome {
    /// Another pass held the single-flight guard; nothing was done.
    AlreadyRunning,
    Completed(PassReport),
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchStatus {
    pub timer_active: bool,
    pub pass_running: bool,
    /// Invoices due right now, counted fresh.
    pub due_count: usize,
    pub last_pass: Option<PassReport>,
}
