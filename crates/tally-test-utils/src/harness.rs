// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring the lifecycle engine and scheduler to test doubles.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use tally_core::{Invoice, InvoiceDraft, LineItemDraft, TallyError};
use tally_dispatch::{DispatchSettings, RecurringDispatcher};
use tally_ledger::InvoiceLifecycle;

use crate::{ManualClock, MemoryInvoiceStore, MockDeliveryChannel, MockDocuments, SequenceAllocator};

/// A draft with one line item, `quantity × price`, for `client`.
pub fn sample_draft(client: &str, phone: Option<&str>) -> InvoiceDraft {
    InvoiceDraft {
        client: client.to_string(),
        client_phone: phone.map(str::to_string),
        items: vec![LineItemDraft {
            name: "Monthly service".into(),
            unit: "month".into(),
            quantity: Decimal::ONE,
            price: Decimal::from(1000),
        }],
        ..Default::default()
    }
}

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    start: DateTime<Utc>,
    first_number: i64,
    settings: DispatchSettings,
    with_renderer: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            start: Utc
                .with_ymd_and_hms(2026, 1, 31, 9, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
            first_number: 1,
            settings: DispatchSettings {
                check_interval: Duration::from_secs(600),
                send_delay: Duration::from_secs(600),
                initial_delay: Duration::from_secs(60),
            },
            with_renderer: true,
        }
    }

    /// Initial time on the manual clock.
    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn first_invoice_number(mut self, first: i64) -> Self {
        self.first_number = first;
        self
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Leave the engine without a document renderer.
    pub fn without_renderer(mut self) -> Self {
        self.with_renderer = false;
        self
    }

    pub fn build(self) -> TestHarness {
        let store = Arc::new(MemoryInvoiceStore::new());
        let allocator = Arc::new(SequenceAllocator::starting_at(self.first_number));
        let documents = Arc::new(MockDocuments::new());
        let channel = Arc::new(MockDeliveryChannel::new());
        let clock = Arc::new(ManualClock::new(self.start));

        let mut lifecycle = InvoiceLifecycle::new(store.clone(), allocator.clone(), clock.clone());
        if self.with_renderer {
            lifecycle = lifecycle.with_renderer(documents.clone());
        }
        let lifecycle = Arc::new(lifecycle);

        let dispatcher = RecurringDispatcher::new(
            lifecycle.clone(),
            documents.clone(),
            channel.clone(),
            clock.clone(),
            self.settings,
        );

        TestHarness {
            store,
            allocator,
            documents,
            channel,
            clock,
            lifecycle,
            dispatcher,
        }
    }
}

/// Engine and scheduler over in-memory doubles.
pub struct TestHarness {
    pub store: Arc<MemoryInvoiceStore>,
    pub allocator: Arc<SequenceAllocator>,
    pub documents: Arc<MockDocuments>,
    pub channel: Arc<MockDeliveryChannel>,
    pub clock: Arc<ManualClock>,
    pub lifecycle: Arc<InvoiceLifecycle>,
    pub dispatcher: RecurringDispatcher,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create an invoice armed for auto-send at `next_send_date`, with a document on file.
    pub async fn seed_due_invoice(
        &self,
        client: &str,
        phone: Option<&str>,
        next_send_date: DateTime<Utc>,
    ) -> Result<Invoice, TallyError> {
        let created = self
            .lifecycle
            .create_invoice(sample_draft(client, phone))
            .await?
            .invoice;
        self.documents.add([created.invoice_number]).await;
        self.lifecycle
            .set_auto_send(&created.id, true, Some(next_send_date))
            .await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
