// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the collaborators the invoice engine consumes.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod delivery;
pub mod documents;
pub mod numbering;
pub mod storage;

pub use adapter::PluginAdapter;
pub use delivery::DeliveryChannel;
pub use documents::{DocumentRenderer, DocumentResolver};
pub use numbering::InvoiceNumberAllocator;
pub use storage::InvoiceStore;
