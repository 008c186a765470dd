// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed record store for invoices.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::TallyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Invoice, InvoiceId};

/// Durable, immediately-consistent storage for invoice records.
///
/// The lifecycle engine serializes its own read-modify-write cycles; stores
/// only need each individual call to be atomic.
#[async_trait]
pub trait InvoiceStore: PluginAdapter {
    /// Fetch one invoice by id.
    async fn get(&self, id: &InvoiceId) -> Result<Option<Invoice>, TallyError>;

    /// All invoices, ordered by invoice number.
    async fn list(&self) -> Result<Vec<Invoice>, TallyError>;

    /// Invoices matching `predicate`, in [`list`](Self::list) order.
    async fn query_where(
        &self,
        predicate: &(dyn for<'a> Fn(&'a Invoice) -> bool + Send + Sync),
    ) -> Result<Vec<Invoice>, TallyError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|invoice| predicate(invoice))
            .collect())
    }

    /// Invoices due for a recurring send at `now`, ordered by
    /// `next_send_date` then `invoice_number`.
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Invoice>, TallyError> {
        let mut due = self.query_where(&move |invoice: &Invoice| invoice.is_due(now)).await?;
        due.sort_by(|a, b| {
            a.next_send_date
                .cmp(&b.next_send_date)
                .then(a.invoice_number.cmp(&b.invoice_number))
        });
        Ok(due)
    }

    /// Insert or replace an invoice keyed by its id.
    async fn put(&self, invoice: &Invoice) -> Result<(), TallyError>;

    /// Remove an invoice. Returns `false` when no record existed.
    async fn delete(&self, id: &InvoiceId) -> Result<bool, TallyError>;
}
