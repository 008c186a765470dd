// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine construction and invoice CRUD.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use tally_core::{
    Clock, DocumentRenderer, Invoice, InvoiceDraft, InvoiceId, InvoiceNumberAllocator,
    InvoiceStore, LineItemDraft, TallyError,
};

use crate::validation::validate_draft;

/// Result of creating an invoice.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub invoice: Invoice,
    /// Set when the document could not be rendered. The invoice is still stored.
    pub warning: Option<String>,
}

/// Owns every state transition on invoices.
///
/// Read-modify-write cycles run under one engine-wide write lock, so two
/// engine calls never interleave on the same record.
pub struct InvoiceLifecycle {
    pub(crate) store: Arc<dyn InvoiceStore>,
    pub(crate) allocator: Arc<dyn InvoiceNumberAllocator>,
    pub(crate) renderer: Option<Arc<dyn DocumentRenderer>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) write_lock: Mutex<()>,
}

impl InvoiceLifecycle {
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        allocator: Arc<dyn InvoiceNumberAllocator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            allocator,
            renderer: None,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Render documents for created and duplicated invoices with `renderer`.
    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn store(&self) -> &Arc<dyn InvoiceStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load an invoice or fail with `NotFound`.
    pub(crate) async fn load(&self, id: &InvoiceId) -> Result<Invoice, TallyError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| TallyError::not_found(id))
    }

    /// Render the document for `invoice` if a renderer is configured.
    pub(crate) async fn render(&self, invoice: &Invoice) -> Result<(), TallyError> {
        let Some(renderer) = &self.renderer else {
            return Ok(());
        };
        let document = renderer.render(invoice).await?;
        info!(
            invoice_number = invoice.invoice_number,
            path = %document.path.display(),
            "invoice document rendered"
        );
        Ok(())
    }

    /// Allocate a number, derive totals, and persist a new unpaid invoice.
    pub async fn create_invoice(&self, draft: InvoiceDraft) -> Result<CreateOutcome, TallyError> {
        validate_draft(&draft)?;

        let invoice = {
            let _guard = self.write_lock.lock().await;
            let number = self.allocator.next_number().await?;
            let invoice = Invoice::from_draft(number, draft, self.now())?;
            self.store.put(&invoice).await?;
            invoice
        };

        info!(
            invoice_id = %invoice.id,
            invoice_number = invoice.invoice_number,
            client = %invoice.client,
            amount = %invoice.amount,
            "invoice created"
        );

        let warning = match self.render(&invoice).await {
            Ok(()) => None,
            Err(e) => {
                warn!(invoice_id = %invoice.id, error = %e, "invoice document not rendered");
                Some(format!("document not rendered: {e}"))
            }
        };

        Ok(CreateOutcome { invoice, warning })
    }

    /// Replace the billable content of an invoice.
    ///
    /// Payment and auto-send state carry over. A draft with `auto_send_from`
    /// arms auto-send with that date.
    pub async fn update_invoice(
        &self,
        id: &InvoiceId,
        draft: InvoiceDraft,
    ) -> Result<Invoice, TallyError> {
        validate_draft(&draft)?;

        let invoice = {
            let _guard = self.write_lock.lock().await;
            let mut invoice = self.load(id).await?;
            invoice.client = draft.client;
            invoice.client_phone = draft.client_phone;
            invoice.items = LineItemDraft::build_all(draft.items)?;
            invoice.discount = draft.discount;
            invoice.payment = draft.payment;
            if let Some(first) = draft.auto_send_from {
                invoice.auto_send_enabled = true;
                invoice.next_send_date = Some(first);
            }
            invoice.recompute_amount()?;
            invoice.updated_at = self.now();
            self.store.put(&invoice).await?;
            invoice
        };

        info!(invoice_id = %invoice.id, amount = %invoice.amount, "invoice updated");
        if let Err(e) = self.render(&invoice).await {
            warn!(invoice_id = %invoice.id, error = %e, "invoice document not re-rendered");
        }
        Ok(invoice)
    }

    pub async fn get_invoice(&self, id: &InvoiceId) -> Result<Invoice, TallyError> {
        self.load(id).await
    }

    /// All invoices ordered by number.
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, TallyError> {
        self.store.list().await
    }

    pub async fn delete_invoice(&self, id: &InvoiceId) -> Result<(), TallyError> {
        let _guard = self.write_lock.lock().await;
        if !self.store.delete(id).await? {
            return Err(TallyError::not_found(id));
        }
        info!(invoice_id = %id, "invoice deleted");
        Ok(())
    }
}
