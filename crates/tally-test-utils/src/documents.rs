// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory document resolver and renderer.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tally_core::{DocumentRenderer, DocumentResolver, Invoice, InvoiceDocument, TallyError};

/// Tracks which invoice numbers have a document. Rendering registers one.
#[derive(Default)]
pub struct MockDocuments {
    available: Mutex<BTreeSet<i64>>,
    rendered: Mutex<Vec<i64>>,
    fail_render: AtomicBool,
}

impl MockDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark documents for `numbers` as present.
    pub async fn add(&self, numbers: impl IntoIterator<Item = i64>) {
        self.available.lock().await.extend(numbers);
    }

    pub async fn remove(&self, number: i64) {
        self.available.lock().await.remove(&number);
    }

    pub fn set_fail_render(&self, fail: bool) {
        self.fail_render.store(fail, Ordering::SeqCst);
    }

    /// Invoice numbers passed to `render`, in call order.
    pub async fn rendered(&self) -> Vec<i64> {
        self.rendered.lock().await.clone()
    }

    fn document_for(number: i64) -> InvoiceDocument {
        InvoiceDocument::pdf(PathBuf::from(format!("/documents/invoice_{number}.pdf")))
    }
}

#[async_trait]
impl DocumentResolver for MockDocuments {
    async fn find_document(
        &self,
        invoice_number: i64,
    ) -> Result<Option<InvoiceDocument>, TallyError> {
        Ok(self
            .available
            .lock()
            .await
            .contains(&invoice_number)
            .then(|| Self::document_for(invoice_number)))
    }
}

#[async_trait]
impl DocumentRenderer for MockDocuments {
    async fn render(&self, invoice: &Invoice) -> Result<InvoiceDocument, TallyError> {
        self.rendered.lock().await.push(invoice.invoice_number);
        if self.fail_render.load(Ordering::SeqCst) {
            return Err(TallyError::Internal("renderer failure injected".into()));
        }
        self.available.lock().await.insert(invoice.invoice_number);
        Ok(Self::document_for(invoice.invoice_number))
    }
}
