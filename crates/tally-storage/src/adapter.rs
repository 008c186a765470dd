// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the InvoiceStore trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use tally_config::model::StorageConfig;
use tally_core::{
    AdapterType, HealthStatus, Invoice, InvoiceId, InvoiceStore, PluginAdapter, TallyError,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed invoice store.
pub struct SqliteInvoiceStore {
    db: Database,
}

impl SqliteInvoiceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database named by `config` and wrap it.
    pub async fn open(config: &StorageConfig) -> Result<Self, TallyError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite invoice store initialized");
        Ok(Self::new(db))
    }

    /// Shared database handle, for components that use the same file.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PluginAdapter for SqliteInvoiceStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TallyError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TallyError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl InvoiceStore for SqliteInvoiceStore {
    async fn get(&self, id: &InvoiceId) -> Result<Option<Invoice>, TallyError> {
        queries::invoices::get_invoice(&self.db, id).await
    }

    async fn list(&self) -> Result<Vec<Invoice>, TallyError> {
        queries::invoices::list_invoices(&self.db).await
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Invoice>, TallyError> {
        queries::invoices::list_due(&self.db, now).await
    }

    async fn put(&self, invoice: &Invoice) -> Result<(), TallyError> {
        queries::invoices::upsert_invoice(&self.db, invoice).await
    }

    async fn delete(&self, id: &InvoiceId) -> Result<bool, TallyError> {
        queries::invoices::delete_invoice(&self.db, id).await
    }
}
