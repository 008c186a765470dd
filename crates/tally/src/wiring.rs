// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Construction of the production object graph from configuration.

use std::sync::Arc;

use tracing::info;

use tally_config::TallyConfig;
use tally_core::{Clock, SystemClock, TallyError};
use tally_dispatch::{DispatchSettings, RecurringDispatcher};
use tally_ledger::InvoiceLifecycle;
use tally_storage::{FsDocumentResolver, SqliteInvoiceStore, SqliteNumberAllocator};
use tally_whatsapp::WhatsAppBridgeChannel;

/// Everything the subcommands operate on.
pub struct Services {
    pub store: Arc<SqliteInvoiceStore>,
    pub channel: Arc<WhatsAppBridgeChannel>,
    pub lifecycle: Arc<InvoiceLifecycle>,
    pub dispatcher: RecurringDispatcher,
}

/// Open storage and build the engine, channel and scheduler.
///
/// No document renderer is attached: documents are produced outside this
/// process and picked up from `documents.dir`.
pub async fn build_services(config: &TallyConfig) -> Result<Services, TallyError> {
    let store = Arc::new(SqliteInvoiceStore::open(&config.storage).await?);
    let allocator = Arc::new(SqliteNumberAllocator::new(
        store.database().clone(),
        config.storage.first_invoice_number,
    ));
    let documents = Arc::new(FsDocumentResolver::from_config(&config.documents));
    let channel = Arc::new(WhatsAppBridgeChannel::new(&config.whatsapp)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let lifecycle = Arc::new(InvoiceLifecycle::new(
        store.clone(),
        allocator,
        clock.clone(),
    ));
    let dispatcher = RecurringDispatcher::new(
        lifecycle.clone(),
        documents,
        channel.clone(),
        clock,
        DispatchSettings::from(&config.dispatch),
    );

    info!(
        database = %config.storage.database_path,
        documents = %config.documents.dir,
        "services initialized"
    );

    Ok(Services {
        store,
        channel,
        lifecycle,
        dispatcher,
    })
}
