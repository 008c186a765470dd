// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendered invoice document lookup and generation.

use async_trait::async_trait;

use crate::error::TallyError;
use crate::types::{Invoice, InvoiceDocument};

/// Locates a previously rendered document by invoice number.
#[async_trait]
pub trait DocumentResolver: Send + Sync + 'static {
    async fn find_document(
        &self,
        invoice_number: i64,
    ) -> Result<Option<InvoiceDocument>, TallyError>;
}

/// Produces the document for an invoice (PDF layout, QR code, upload).
#[async_trait]
pub trait DocumentRenderer: Send + Sync + 'static {
    async fn render(&self, invoice: &Invoice) -> Result<InvoiceDocument, TallyError>;
}
