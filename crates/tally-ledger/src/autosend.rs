// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auto-send arming, the due query, and month-based advancement.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use tally_core::calendar;
use tally_core::{Invoice, InvoiceId, TallyError};

use crate::engine::InvoiceLifecycle;

impl InvoiceLifecycle {
    /// Enable or disable recurring sends. `next_send_date` is overwritten
    /// only when supplied, and is not checked against the current time.
    pub async fn set_auto_send(
        &self,
        id: &InvoiceId,
        enabled: bool,
        next_send_date: Option<DateTime<Utc>>,
    ) -> Result<Invoice, TallyError> {
        let _guard = self.write_lock.lock().await;
        let mut invoice = self.load(id).await?;
        invoice.auto_send_enabled = enabled;
        if let Some(date) = next_send_date {
            invoice.next_send_date = Some(date);
        }
        invoice.updated_at = self.now();
        self.store.put(&invoice).await?;
        info!(
            invoice_id = %invoice.id,
            enabled,
            next_send_date = ?invoice.next_send_date,
            "auto-send updated"
        );
        Ok(invoice)
    }

    /// Invoices with auto-send enabled and `next_send_date <= now`,
    /// ordered by `next_send_date` then number.
    pub async fn due_for_auto_send(&self, now: DateTime<Utc>) -> Result<Vec<Invoice>, TallyError> {
        self.store.list_due(now).await
    }

    /// Move `next_send_date` forward one calendar month and record the send.
    ///
    /// Day-of-month is kept, clamped to the target month's length. An
    /// invoice without a `next_send_date` is returned unchanged.
    pub async fn advance_next_send_date(
        &self,
        id: &InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<Invoice, TallyError> {
        let _guard = self.write_lock.lock().await;
        let mut invoice = self.load(id).await?;
        let Some(current) = invoice.next_send_date else {
            debug!(invoice_id = %invoice.id, "no next_send_date to advance");
            return Ok(invoice);
        };
        let next = calendar::next_month(current)?;
        invoice.next_send_date = Some(next);
        invoice.last_sent_at = Some(now);
        invoice.updated_at = self.now();
        self.store.put(&invoice).await?;
        debug!(invoice_id = %invoice.id, %next, "next send date advanced");
        Ok(invoice)
    }
}
