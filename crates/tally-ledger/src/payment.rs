// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment toggling and the duplication rule.
//!
//! Marking an unpaid invoice paid creates its successor: a copy with a fresh
//! number, armed to auto-send one month after the payment. Duplication is
//! best-effort. Its failure never undoes the payment.

use serde::Serialize;
use tracing::{info, warn};

use tally_core::calendar;
use tally_core::{Invoice, InvoiceDraft, InvoiceId, TallyError};

use crate::engine::InvoiceLifecycle;

/// Result of [`InvoiceLifecycle::mark_paid`].
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    /// The paid invoice as stored after the call.
    pub invoice: Invoice,
    /// The successor invoice, when one was created.
    pub duplicate: Option<Invoice>,
    /// Duplication or rendering problem. The payment change stands regardless.
    pub warning: Option<String>,
}

/// Result of the duplication rule.
#[derive(Debug, Clone)]
pub struct Duplication {
    /// The source invoice after auto-send was handed over to the successor.
    pub source: Invoice,
    pub duplicate: Invoice,
    /// Set when the successor's document could not be rendered.
    pub warning: Option<String>,
}

impl InvoiceLifecycle {
    /// Mark an invoice paid. Only the unpaid-to-paid edge duplicates it.
    pub async fn mark_paid(&self, id: &InvoiceId) -> Result<PaymentOutcome, TallyError> {
        let (invoice, newly_paid) = {
            let _guard = self.write_lock.lock().await;
            let mut invoice = self.load(id).await?;
            if invoice.paid {
                (invoice, false)
            } else {
                let now = self.now();
                invoice.paid = true;
                invoice.paid_at = Some(now);
                invoice.updated_at = now;
                self.store.put(&invoice).await?;
                (invoice, true)
            }
        };

        if !newly_paid {
            return Ok(PaymentOutcome {
                invoice,
                duplicate: None,
                warning: None,
            });
        }

        info!(
            invoice_id = %invoice.id,
            invoice_number = invoice.invoice_number,
            "invoice marked paid"
        );

        match self.on_payment_confirmed(id).await {
            Ok(duplication) => Ok(PaymentOutcome {
                invoice: duplication.source,
                duplicate: Some(duplication.duplicate),
                warning: duplication.warning,
            }),
            Err(e) => {
                warn!(invoice_id = %invoice.id, error = %e, "payment recorded but duplication failed");
                Ok(PaymentOutcome {
                    invoice,
                    duplicate: None,
                    warning: Some(e.to_string()),
                })
            }
        }
    }

    /// Mark an invoice unpaid. Has no other side effects.
    pub async fn mark_unpaid(&self, id: &InvoiceId) -> Result<Invoice, TallyError> {
        let _guard = self.write_lock.lock().await;
        let mut invoice = self.load(id).await?;
        if !invoice.paid {
            return Ok(invoice);
        }
        invoice.paid = false;
        invoice.paid_at = None;
        invoice.updated_at = self.now();
        self.store.put(&invoice).await?;
        info!(invoice_id = %invoice.id, "invoice marked unpaid");
        Ok(invoice)
    }

    /// Create the successor of a paid invoice.
    ///
    /// The successor copies client, phone, items, discount and payment
    /// details, gets a fresh number, and is armed for `now + 1 month`. If the
    /// source had auto-send enabled, it is disabled once the successor is
    /// stored. Allocation and persistence failures before the successor is
    /// stored come back as [`TallyError::Duplication`]. Once the successor
    /// exists it is always returned, and a failed handover is a warning.
    pub async fn on_payment_confirmed(&self, id: &InvoiceId) -> Result<Duplication, TallyError> {
        let (source, duplicate, handover_warning) = {
            let _guard = self.write_lock.lock().await;
            let source = self.load(id).await?;
            let fail = |e: TallyError| TallyError::Duplication {
                source_id: id.to_string(),
                message: e.to_string(),
            };

            let now = self.now();
            let number = self.allocator.next_number().await.map_err(fail)?;
            let mut duplicate =
                Invoice::from_draft(number, InvoiceDraft::from_invoice(&source), now)
                    .map_err(fail)?;
            duplicate.auto_send_enabled = true;
            duplicate.next_send_date = Some(calendar::next_month(now).map_err(fail)?);
            self.store.put(&duplicate).await.map_err(fail)?;

            let mut handover_warning = None;
            let source = if source.auto_send_enabled {
                let mut disabled = source.clone();
                disabled.auto_send_enabled = false;
                disabled.next_send_date = None;
                disabled.updated_at = now;
                match self.store.put(&disabled).await {
                    Ok(()) => disabled,
                    Err(e) => {
                        warn!(
                            invoice_id = %source.id,
                            successor_id = %duplicate.id,
                            error = %e,
                            "successor stored but source auto-send not disabled"
                        );
                        handover_warning = Some(format!(
                            "successor #{} created but auto-send on #{} is still enabled: {e}",
                            duplicate.invoice_number, source.invoice_number
                        ));
                        source
                    }
                }
            } else {
                source
            };
            (source, duplicate, handover_warning)
        };

        info!(
            source_id = %source.id,
            invoice_id = %duplicate.id,
            invoice_number = duplicate.invoice_number,
            next_send_date = ?duplicate.next_send_date,
            "successor invoice created"
        );

        let render_warning = self.render(&duplicate).await.err().map(|e| {
            warn!(invoice_id = %duplicate.id, error = %e, "successor document not rendered");
            format!("successor document not rendered: {e}")
        });

        let warning = match (handover_warning, render_warning) {
            (Some(a), Some(b)) => Some(format!("{a}; {b}")),
            (a, b) => a.or(b),
        };

        Ok(Duplication {
            source,
            duplicate,
            warning,
        })
    }
}
