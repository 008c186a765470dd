// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tally integration tests.
//!
//! In-memory and scripted stand-ins for every adapter seam, so the
//! lifecycle engine and the scheduler run deterministically without a
//! database, a filesystem, or a messaging session.
//!
//! # Components
//!
//! - [`MemoryInvoiceStore`] - map-backed store with injectable failures
//! - [`MockDeliveryChannel`] - records sends, scripted failures, pausable
//! - [`ManualClock`] - settable time; `sleep` advances it and is recorded
//! - [`MockDocuments`] - document resolver and renderer
//! - [`SequenceAllocator`] - counting number allocator
//! - [`TestHarness`] - engine and scheduler wired to all of the above

pub mod allocator;
pub mod clock;
pub mod documents;
pub mod harness;
pub mod memory_store;
pub mod mock_channel;

pub use allocator::SequenceAllocator;
pub use clock::ManualClock;
pub use documents::MockDocuments;
pub use harness::{TestHarness, sample_draft};
pub use memory_store::MemoryInvoiceStore;
pub use mock_channel::{MockDeliveryChannel, SentDocument};
