// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Tally.
//!
//! This crate provides the invoice domain types, decimal money math, the
//! calendar-month recurrence rule, the shared error type, and the adapter
//! traits that storage, document, and delivery backends implement.

pub mod calendar;
pub mod clock;
pub mod error;
pub mod money;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::{DeliveryError, DeliveryErrorKind, TallyError};
pub use money::Totals;
pub use types::{
    AdapterType, Discount, Expense, HealthStatus, Invoice, InvoiceDocument, InvoiceDraft,
    InvoiceId, LineItem, LineItemDraft, PaymentDetails, Recipient,
};

pub use traits::{
    DeliveryChannel, DocumentRenderer, DocumentResolver, InvoiceNumberAllocator, InvoiceStore,
    PluginAdapter,
};
