// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timer, single-flight guard, and the dispatch pass itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tally_config::model::DispatchConfig;
use tally_core::{Clock, DeliveryChannel, DocumentResolver, Invoice, TallyError};
use tally_ledger::InvoiceLifecycle;

use crate::message::compose_caption;
use crate::recipient::recipient_for;
use crate::report::{
    DispatchFailure, DispatchStatus, FailureKind, PassOutcome, PassReport, SentInvoice,
};

/// Timing knobs for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Period between due checks.
    pub check_interval: Duration,
    /// Pause between consecutive sends within a pass.
    pub send_delay: Duration,
    /// Delay before the first check after `start()`.
    pub initial_delay: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatchSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            check_interval: config.check_interval(),
            send_delay: config.send_delay(),
            initial_delay: config.initial_delay(),
        }
    }
}

/// Resets the running flag when a pass ends, including by error or panic.
struct PassGuard {
    running: Arc<AtomicBool>,
}

impl PassGuard {
    fn try_acquire(running: &Arc<AtomicBool>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                running: Arc::clone(running),
            })
    }
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

struct Inner {
    lifecycle: Arc<InvoiceLifecycle>,
    documents: Arc<dyn DocumentResolver>,
    channel: Arc<dyn DeliveryChannel>,
    clock: Arc<dyn Clock>,
    settings: DispatchSettings,
    running: Arc<AtomicBool>,
    timer: Mutex<Option<CancellationToken>>,
    last_pass: Mutex<Option<PassReport>>,
}

/// Periodically delivers due recurring invoices.
///
/// Cheap to clone; clones share the timer, guard, and last report.
#[derive(Clone)]
pub struct RecurringDispatcher {
    inner: Arc<Inner>,
}

impl RecurringDispatcher {
    pub fn new(
        lifecycle: Arc<InvoiceLifecycle>,
        documents: Arc<dyn DocumentResolver>,
        channel: Arc<dyn DeliveryChannel>,
        clock: Arc<dyn Clock>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                lifecycle,
                documents,
                channel,
                clock,
                settings,
                running: Arc::new(AtomicBool::new(false)),
                timer: Mutex::new(None),
                last_pass: Mutex::new(None),
            }),
        }
    }

    pub fn settings(&self) -> DispatchSettings {
        self.inner.settings
    }

    /// Start the timer. Returns `false` if it was already running.
    ///
    /// The first check fires after `initial_delay`, then every
    /// `check_interval`. Each tick spawns its own pass so that a long pass
    /// does not delay the timer; overlapping ticks hit the single-flight
    /// guard and are dropped.
    pub async fn start(&self) -> bool {
        let mut timer = self.inner.timer.lock().await;
        if timer.as_ref().is_some_and(|t| !t.is_cancelled()) {
            debug!("dispatcher already started");
            return false;
        }

        let cancel = CancellationToken::new();
        *timer = Some(cancel.clone());
        drop(timer);

        let settings = self.inner.settings;
        let this = self.clone();
        tokio::spawn(async move {
            let first = Instant::now() + settings.initial_delay;
            let mut interval = tokio::time::interval_at(first, settings.check_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let pass = this.clone();
                        tokio::spawn(async move { pass.run_scheduled_pass().await });
                    }
                    _ = cancel.cancelled() => {
                        info!("dispatch timer stopped");
                        break;
                    }
                }
            }
        });

        info!(
            check_interval_secs = settings.check_interval.as_secs(),
            send_delay_secs = settings.send_delay.as_secs(),
            initial_delay_secs = settings.initial_delay.as_secs(),
            "dispatch timer started"
        );
        true
    }

    /// Stop future ticks. A pass already in flight runs to completion.
    pub async fn stop(&self) {
        if let Some(token) = self.inner.timer.lock().await.take() {
            token.cancel();
        }
    }

    pub async fn is_started(&self) -> bool {
        self.inner
            .timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    pub fn is_pass_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Run one pass at `now`, unless another pass is active.
    ///
    /// Per-invoice problems land in the report. Only a failing due query
    /// aborts the pass with an error.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassOutcome, TallyError> {
        let Some(guard) = PassGuard::try_acquire(&self.inner.running) else {
            debug!("dispatch pass already running, skipping");
            return Ok(PassOutcome::AlreadyRunning);
        };
        self.execute_pass(guard, now).await.map(PassOutcome::Completed)
    }

    /// Start an out-of-cycle pass in the background.
    ///
    /// Returns `false` without spawning when a pass is already running.
    pub fn trigger_now(&self) -> bool {
        let Some(guard) = PassGuard::try_acquire(&self.inner.running) else {
            debug!("manual dispatch ignored: pass already running");
            return false;
        };
        let this = self.clone();
        tokio::spawn(async move {
            let now = this.inner.clock.now();
            if let Err(e) = this.execute_pass(guard, now).await {
                warn!(error = %e, "manual dispatch pass failed");
            }
        });
        true
    }

    /// Timer state, guard state, and a fresh due count.
    pub async fn status(&self) -> Result<DispatchStatus, TallyError> {
        let due = self
            .inner
            .lifecycle
            .due_for_auto_send(self.inner.clock.now())
            .await?;
        Ok(DispatchStatus {
            timer_active: self.is_started().await,
            pass_running: self.is_pass_running(),
            due_count: due.len(),
            last_pass: self.inner.last_pass.lock().await.clone(),
        })
    }

    async fn run_scheduled_pass(&self) {
        let now = self.inner.clock.now();
        if let Err(e) = self.run_pass(now).await {
            warn!(error = %e, "dispatch pass aborted");
        }
    }

    async fn execute_pass(
        &self,
        _guard: PassGuard,
        now: DateTime<Utc>,
    ) -> Result<PassReport, TallyError> {
        let due = self.inner.lifecycle.due_for_auto_send(now).await?;
        if due.is_empty() {
            debug!("no invoices due for auto-send");
            let report = PassReport::empty(now);
            *self.inner.last_pass.lock().await = Some(report.clone());
            return Ok(report);
        }

        info!(count = due.len(), "dispatching due invoices");
        let mut report = PassReport::empty(now);
        report.due = due.len();

        let last = due.len() - 1;
        for (index, invoice) in due.iter().enumerate() {
            match self.dispatch_one(invoice, now).await {
                Ok(advanced) => {
                    info!(
                        invoice_id = %invoice.id,
                        invoice_number = invoice.invoice_number,
                        next_send_date = ?advanced.next_send_date,
                        "recurring invoice sent"
                    );
                    report.sent.push(SentInvoice {
                        invoice_id: advanced.id,
                        invoice_number: advanced.invoice_number,
                        next_send_date: advanced.next_send_date,
                    });
                }
                Err(e) => {
                    warn!(
                        invoice_id = %invoice.id,
                        invoice_number = invoice.invoice_number,
                        error = %e,
                        "recurring invoice not sent"
                    );
                    report.failures.push(DispatchFailure {
                        invoice_id: invoice.id.clone(),
                        invoice_number: invoice.invoice_number,
                        kind: FailureKind::from(&e),
                        message: e.to_string(),
                    });
                }
            }

            if index < last {
                self.inner.clock.sleep(self.inner.settings.send_delay).await;
            }
        }

        report.finished_at = self.inner.clock.now();
        info!(
            due = report.due,
            sent = report.sent.len(),
            failed = report.failures.len(),
            "dispatch pass complete"
        );
        *self.inner.last_pass.lock().await = Some(report.clone());
        Ok(report)
    }

    /// Send one invoice and advance its date. Nothing is advanced on failure.
    async fn dispatch_one(
        &self,
        invoice: &Invoice,
        now: DateTime<Utc>,
    ) -> Result<Invoice, TallyError> {
        let recipient = recipient_for(invoice)?;
        let document = self
            .inner
            .documents
            .find_document(invoice.invoice_number)
            .await?
            .ok_or(TallyError::DocumentNotFound {
                invoice_number: invoice.invoice_number,
            })?;

        let caption = compose_caption(invoice);
        self.inner
            .channel
            .send_document(&recipient, &caption, &document)
            .await?;

        self.inner
            .lifecycle
            .advance_next_send_date(&invoice.id, now)
            .await
    }
}
