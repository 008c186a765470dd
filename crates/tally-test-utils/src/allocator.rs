// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counting invoice number allocator.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tally_core::{InvoiceNumberAllocator, TallyError};

/// Hands out `start`, `start + 1`, ... Can be switched to fail.
pub struct SequenceAllocator {
    next: AtomicI64,
    failing: AtomicBool,
}

impl SequenceAllocator {
    pub fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The number the next successful call will return.
    pub fn peek(&self) -> i64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

#[async_trait]
impl InvoiceNumberAllocator for SequenceAllocator {
    async fn next_number(&self) -> Result<i64, TallyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TallyError::Internal("number allocator unavailable".into()));
        }
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }
}
