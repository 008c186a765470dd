// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recurring dispatch scheduler for Tally.
//!
//! [`RecurringDispatcher`] wakes on a fixed interval, finds invoices due for
//! a recurring send, and delivers them one at a time with a pause between
//! sends. At most one pass runs at a time; overlapping ticks are dropped.

pub mod message;
pub mod recipient;
pub mod report;
pub mod scheduler;

pub use report::{DispatchFailure, DispatchStatus, FailureKind, PassOutcome, PassReport, SentInvoice};
pub use scheduler::{DispatchSettings, RecurringDispatcher};
