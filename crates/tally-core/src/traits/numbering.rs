// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice number allocation.

use async_trait::async_trait;

use crate::error::TallyError;

/// Hands out human-facing invoice numbers, monotonically increasing process-wide.
#[async_trait]
pub trait InvoiceNumberAllocator: Send + Sync + 'static {
    async fn next_number(&self) -> Result<i64, TallyError>;
}
