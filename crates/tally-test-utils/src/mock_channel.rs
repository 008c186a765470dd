// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock delivery channel for deterministic testing.
//!
//! Records every attempted send, fails scripted attempts, and can hold
//! sends open until released so tests can observe a pass mid-flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use tally_core::{
    AdapterType, DeliveryChannel, DeliveryError, DeliveryErrorKind, HealthStatus,
    InvoiceDocument, PluginAdapter, Recipient, TallyError,
};

/// One captured send attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SentDocument {
    pub recipient: Recipient,
    pub text: String,
    pub document: InvoiceDocument,
    /// Whether the attempt was reported as delivered.
    pub delivered: bool,
}

pub struct MockDeliveryChannel {
    attempts: Mutex<Vec<SentDocument>>,
    /// Attempt number (1-based) to failure kind.
    scripted: Mutex<HashMap<usize, DeliveryErrorKind>>,
    /// Recipients that always fail.
    rejected: Mutex<HashMap<Recipient, DeliveryErrorKind>>,
    calls: AtomicUsize,
    held: watch::Sender<bool>,
}

impl MockDeliveryChannel {
    pub fn new() -> Self {
        let (held, _) = watch::channel(false);
        Self {
            attempts: Mutex::new(Vec::new()),
            scripted: Mutex::new(HashMap::new()),
            rejected: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            held,
        }
    }

    /// Fail the `attempt`-th send (1-based) with `kind`.
    pub async fn fail_attempt(&self, attempt: usize, kind: DeliveryErrorKind) {
        self.scripted.lock().await.insert(attempt, kind);
    }

    /// Fail every send to `recipient` with `kind`.
    pub async fn reject_recipient(&self, recipient: &str, kind: DeliveryErrorKind) {
        self.rejected
            .lock()
            .await
            .insert(Recipient(recipient.to_string()), kind);
    }

    /// Make sends wait until [`release`](Self::release) is called.
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }

    /// Number of `send_document` calls that have started.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every attempt, successful or not.
    pub async fn attempts(&self) -> Vec<SentDocument> {
        self.attempts.lock().await.clone()
    }

    /// Only the attempts reported as delivered.
    pub async fn delivered(&self) -> Vec<SentDocument> {
        self.attempts
            .lock()
            .await
            .iter()
            .filter(|a| a.delivered)
            .cloned()
            .collect()
    }
}

impl Default for MockDeliveryChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockDeliveryChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TallyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TallyError> {
        Ok(())
    }
}

#[async_trait]
impl DeliveryChannel for MockDeliveryChannel {
    async fn send_document(
        &self,
        recipient: &Recipient,
        text: &str,
        document: &InvoiceDocument,
    ) -> Result<(), DeliveryError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let mut held = self.held.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = held.wait_for(|on_hold| !*on_hold).await;

        let failure = match self.scripted.lock().await.get(&attempt) {
            Some(kind) => Some(*kind),
            None => self.rejected.lock().await.get(recipient).copied(),
        };

        self.attempts.lock().await.push(SentDocument {
            recipient: recipient.clone(),
            text: text.to_string(),
            document: document.clone(),
            delivered: failure.is_none(),
        });

        match failure {
            Some(kind) => Err(DeliveryError::new(
                kind,
                format!("scripted failure on attempt {attempt}"),
            )),
            None => Ok(()),
        }
    }
}
