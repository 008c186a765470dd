// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice lifecycle engine for Tally.
//!
//! [`InvoiceLifecycle`] is the single place that changes payment and
//! auto-send state. It owns the one-calendar-month recurrence rule and the
//! duplication rule that creates a successor invoice when one is paid.

pub mod autosend;
pub mod engine;
pub mod expenses;
pub mod payment;
pub mod validation;

pub use engine::{CreateOutcome, InvoiceLifecycle};
pub use expenses::{ExpenseDraft, Profitability};
pub use payment::{Duplication, PaymentOutcome};
