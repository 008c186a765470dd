// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Tally.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer connection
//! via `tokio-rusqlite`. Provides the invoice record store, the invoice
//! number allocator, and the filesystem document resolver.

pub mod adapter;
pub mod database;
pub mod documents;
pub mod migrations;
pub mod numbering;
pub mod queries;

pub use adapter::SqliteInvoiceStore;
pub use database::Database;
pub use documents::FsDocumentResolver;
pub use numbering::SqliteNumberAllocator;
