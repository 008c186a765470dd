// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the invoice engine.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::TallyError;
use crate::money::{self, Totals};

/// Unique identifier for an invoice record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub String);

impl InvoiceId {
    /// Allocate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InvoiceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A normalized phone recipient (digits only, country code first).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient(pub String);

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Channel,
    Documents,
}

/// A single billable line on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: Decimal,
    pub price: Decimal,
    /// `quantity * price`, derived when the item is built.
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Self, TallyError> {
        Ok(Self {
            name: name.into(),
            unit: unit.into(),
            quantity,
            price,
            amount: money::line_amount(quantity, price)?,
        })
    }
}

/// Invoice-level discount. Percent and fixed are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage of the subtotal, 0 to 100.
    Percent(Decimal),
    /// Absolute amount subtracted from the subtotal.
    Fixed(Decimal),
}

/// Bank transfer details printed on the invoice and its payment QR code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub recipient: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub bic: String,
    #[serde(default)]
    pub correspondent_account: String,
    #[serde(default)]
    pub purpose: Option<String>,
}

/// A cost attributed to an invoice for profitability reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub amount: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
}

/// The central invoice record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: i64,
    pub client: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub discount: Option<Discount>,
    /// Post-discount total, stored rather than recomputed on read.
    pub amount: Decimal,
    #[serde(default)]
    pub payment: Option<PaymentDetails>,
    pub paid: bool,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub auto_send_enabled: bool,
    #[serde(default)]
    pub next_send_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Build a new unpaid invoice from a draft.
    ///
    /// Line amounts and the total are derived here. Auto-send stays disabled
    /// unless the draft carries an explicit `auto_send_from` date.
    /// Fails with `Validation` when an amount leaves the decimal range.
    pub fn from_draft(
        invoice_number: i64,
        draft: InvoiceDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, TallyError> {
        let items = LineItemDraft::build_all(draft.items)?;
        let totals = money::compute_totals(&items, draft.discount.as_ref())?;
        Ok(Self {
            id: InvoiceId::generate(),
            invoice_number,
            client: draft.client,
            client_phone: draft.client_phone,
            items,
            discount: draft.discount,
            amount: totals.total,
            payment: draft.payment,
            paid: false,
            paid_at: None,
            auto_send_enabled: draft.auto_send_from.is_some(),
            next_send_date: draft.auto_send_from,
            last_sent_at: None,
            expenses: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Subtotal, discount and total for the current items.
    pub fn totals(&self) -> Result<Totals, TallyError> {
        money::compute_totals(&self.items, self.discount.as_ref())
    }

    /// Recompute and store `amount` from the current items and discount.
    pub fn recompute_amount(&mut self) -> Result<(), TallyError> {
        self.amount = self.totals()?.total;
        Ok(())
    }

    /// Whether the invoice is due for a recurring send at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.auto_send_enabled && self.next_send_date.is_some_and(|next| next <= now)
    }

    /// Sum of attached expenses.
    pub fn total_expenses(&self) -> Result<Decimal, TallyError> {
        money::checked_sum(self.expenses.iter().map(|e| e.amount), "expense total")
    }
}

/// A line item as supplied by a caller, before amounts are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemDraft {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

impl LineItemDraft {
    pub fn build(self) -> Result<LineItem, TallyError> {
        LineItem::new(self.name, self.unit, self.quantity, self.price)
    }

    /// Build every draft, stopping at the first out-of-range amount.
    pub fn build_all(drafts: Vec<Self>) -> Result<Vec<LineItem>, TallyError> {
        drafts.into_iter().map(Self::build).collect()
    }
}

impl From<&LineItem> for LineItemDraft {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// Caller-supplied fields for creating or replacing an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub client: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    pub items: Vec<LineItemDraft>,
    #[serde(default)]
    pub discount: Option<Discount>,
    #[serde(default)]
    pub payment: Option<PaymentDetails>,
    /// Arms auto-send with this first due date when set.
    #[serde(default)]
    pub auto_send_from: Option<DateTime<Utc>>,
}

impl InvoiceDraft {
    /// A draft carrying the billable content of an existing invoice.
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            client: invoice.client.clone(),
            client_phone: invoice.client_phone.clone(),
            items: invoice.items.iter().map(LineItemDraft::from).collect(),
            discount: invoice.discount,
            payment: invoice.payment.clone(),
            auto_send_from: None,
        }
    }
}

/// A rendered invoice artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
}

impl InvoiceDocument {
    /// A PDF document at `path`, named after the final path component.
    pub fn pdf(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "invoice.pdf".to_string());
        Self {
            path,
            file_name,
            mime_type: "application/pdf".to_string(),
        }
    }
}
