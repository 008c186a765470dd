// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory invoice store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use tally_core::{
    AdapterType, HealthStatus, Invoice, InvoiceId, InvoiceStore, PluginAdapter, TallyError,
};

/// Map-backed [`InvoiceStore`] with switchable failures.
#[derive(Default)]
pub struct MemoryInvoiceStore {
    records: Mutex<HashMap<InvoiceId, Invoice>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Remaining successful writes before `put` starts failing.
    writes_before_failure: Mutex<Option<usize>>,
    puts: AtomicUsize,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `get`, `list` and queries fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `put` and `delete` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Allow `n` more writes, then fail the rest.
    pub async fn fail_writes_after(&self, n: usize) {
        *self.writes_before_failure.lock().await = Some(n);
    }

    /// Number of successful `put` calls so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Insert directly, bypassing failure switches.
    pub async fn insert(&self, invoice: Invoice) {
        self.records.lock().await.insert(invoice.id.clone(), invoice);
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    fn check_reads(&self) -> Result<(), TallyError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            debug!("memory store: failing read");
            return Err(storage_error("read failure injected"));
        }
        Ok(())
    }

    async fn check_writes(&self) -> Result<(), TallyError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            debug!("memory store: failing write");
            return Err(storage_error("write failure injected"));
        }
        let mut remaining = self.writes_before_failure.lock().await;
        match remaining.as_mut() {
            Some(0) => {
                debug!("memory store: write allowance used up");
                Err(storage_error("injected write failure"))
            }
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn storage_error(message: &str) -> TallyError {
    TallyError::Storage {
        source: message.to_string().into(),
    }
}

#[async_trait]
impl PluginAdapter for MemoryInvoiceStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TallyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TallyError> {
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn get(&self, id: &InvoiceId) -> Result<Option<Invoice>, TallyError> {
        self.check_reads()?;
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Invoice>, TallyError> {
        self.check_reads()?;
        let mut all: Vec<Invoice> = self.records.lock().await.values().cloned().collect();
        all.sort_by(|a, b| {
            a.invoice_number
                .cmp(&b.invoice_number)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(all)
    }

    async fn put(&self, invoice: &Invoice) -> Result<(), TallyError> {
        self.check_writes().await?;
        self.records
            .lock()
            .await
            .insert(invoice.id.clone(), invoice.clone());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, id: &InvoiceId) -> Result<bool, TallyError> {
        self.check_writes().await?;
        Ok(self.records.lock().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::sample_draft;

    #[tokio::test]
    async fn query_where_accepts_borrowing_predicate() {
        let store = MemoryInvoiceStore::new();
        for (number, client) in [(1, "Acme"), (2, "Globex"), (3, "Acme")] {
            let invoice =
                Invoice::from_draft(number, sample_draft(client, None), Utc::now()).unwrap();
            store.put(&invoice).await.unwrap();
        }

        let wanted = String::from("Acme");
        let found = store
            .query_where(&|invoice: &Invoice| invoice.client == wanted)
            .await
            .unwrap();
        let numbers: Vec<i64> = found.iter().map(|i| i.invoice_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[tokio::test]
    async fn write_allowance_fails_later_puts() {
        let store = MemoryInvoiceStore::new();
        store.fail_writes_after(1).await;
        let first = Invoice::from_draft(1, sample_draft("A", None), Utc::now()).unwrap();
        let second = Invoice::from_draft(2, sample_draft("B", None), Utc::now()).unwrap();
        store.put(&first).await.unwrap();
        assert!(store.put(&second).await.is_err());
        assert_eq!(store.put_count(), 1);
    }
}
