// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed invoice number allocator.

use async_trait::async_trait;
use tally_core::{InvoiceNumberAllocator, TallyError};
use tracing::debug;

use crate::database::Database;
use crate::queries;

/// Hands out monotonically increasing invoice numbers from the `invoice_counter` table.
pub struct SqliteNumberAllocator {
    db: Database,
    first_number: i64,
}

impl SqliteNumberAllocator {
    /// `first_number` is used when nothing has been allocated or stored yet.
    pub fn new(db: Database, first_number: i64) -> Self {
        Self { db, first_number }
    }
}

#[async_trait]
impl InvoiceNumberAllocator for SqliteNumberAllocator {
    async fn next_number(&self) -> Result<i64, TallyError> {
        let number = queries::counter::reserve_next(&self.db, self.first_number).await?;
        debug!(invoice_number = number, "invoice number reserved");
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tally_core::{Invoice, InvoiceDraft};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("numbers.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn starts_at_first_number_and_increments() {
        let (db, _dir) = setup_db().await;
        let allocator = SqliteNumberAllocator::new(db.clone(), 100);

        assert_eq!(allocator.next_number().await.unwrap(), 100);
        assert_eq!(allocator.next_number().await.unwrap(), 101);
        assert_eq!(allocator.next_number().await.unwrap(), 102);
        assert_eq!(queries::counter::last_reserved(&db).await.unwrap(), Some(102));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn never_reuses_stored_numbers() {
        let (db, _dir) = setup_db().await;
        let imported = Invoice::from_draft(57, InvoiceDraft::default(), Utc::now()).unwrap();
        queries::invoices::upsert_invoice(&db, &imported).await.unwrap();

        let allocator = SqliteNumberAllocator::new(db.clone(), 1);
        assert_eq!(allocator.next_number().await.unwrap(), 58);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn counter_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("persist.db");
        let path = db_path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        let allocator = SqliteNumberAllocator::new(db.clone(), 1);
        allocator.next_number().await.unwrap();
        allocator.next_number().await.unwrap();
        drop(allocator);
        db.close().await.unwrap();

        let db = Database::open(path).await.unwrap();
        let allocator = SqliteNumberAllocator::new(db.clone(), 1);
        assert_eq!(allocator.next_number().await.unwrap(), 3);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_reservations_are_unique() {
        let (db, _dir) = setup_db().await;
        let allocator = std::sync::Arc::new(SqliteNumberAllocator::new(db.clone(), 1));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move { allocator.next_number().await.unwrap() }));
        }
        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort();
        assert_eq!(numbers, (1..=10).collect::<Vec<_>>());
    }
}
