// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem lookup of rendered invoice documents.

use std::path::PathBuf;

use async_trait::async_trait;
use tally_config::model::DocumentsConfig;
use tally_core::{DocumentResolver, InvoiceDocument, TallyError};
use tracing::debug;

/// Resolves `<dir>/<prefix><number>.pdf`.
#[derive(Debug, Clone)]
pub struct FsDocumentResolver {
    dir: PathBuf,
    file_prefix: String,
}

impl FsDocumentResolver {
    pub fn new(dir: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_prefix: file_prefix.into(),
        }
    }

    pub fn from_config(config: &DocumentsConfig) -> Self {
        Self::new(&config.dir, &config.file_prefix)
    }

    /// Where the document for `invoice_number` is expected to live.
    pub fn path_for(&self, invoice_number: i64) -> PathBuf {
        self.dir
            .join(format!("{}{invoice_number}.pdf", self.file_prefix))
    }
}

#[async_trait]
impl DocumentResolver for FsDocumentResolver {
    async fn find_document(
        &self,
        invoice_number: i64,
    ) -> Result<Option<InvoiceDocument>, TallyError> {
        let path = self.path_for(invoice_number);
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| TallyError::Storage {
                source: Box::new(e),
            })?;
        if !exists {
            debug!(invoice_number, path = %path.display(), "invoice document not found");
            return Ok(None);
        }
        Ok(Some(InvoiceDocument::pdf(path)))
    }
}
