// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expenses attached to invoices and per-invoice profitability.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::info;

use tally_core::{Expense, Invoice, InvoiceId, TallyError};

use crate::engine::InvoiceLifecycle;

/// Caller-supplied expense fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub amount: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Revenue against attributed costs for one invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profitability {
    pub invoice_id: InvoiceId,
    pub invoice_number: i64,
    pub amount: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    /// `profit / amount * 100`, two decimals. `None` for a zero amount.
    pub margin_percent: Option<Decimal>,
}

impl Profitability {
    /// Fails with `Validation` when a figure leaves the decimal range.
    pub fn of(invoice: &Invoice) -> Result<Self, TallyError> {
        let out_of_range =
            || TallyError::Validation("profitability is out of the representable range".into());
        let expenses = invoice.total_expenses()?;
        let profit = invoice
            .amount
            .checked_sub(expenses)
            .ok_or_else(out_of_range)?;
        let margin_percent = if invoice.amount.is_zero() {
            None
        } else {
            let margin = profit
                .checked_mul(Decimal::ONE_HUNDRED)
                .and_then(|scaled| scaled.checked_div(invoice.amount))
                .ok_or_else(out_of_range)?;
            Some(margin.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        };
        Ok(Self {
            invoice_id: invoice.id.clone(),
            invoice_number: invoice.invoice_number,
            amount: invoice.amount,
            expenses,
            profit,
            margin_percent,
        })
    }
}

impl InvoiceLifecycle {
    /// Attach an expense. Returns the updated invoice.
    pub async fn add_expense(
        &self,
        id: &InvoiceId,
        draft: ExpenseDraft,
    ) -> Result<Invoice, TallyError> {
        if draft.amount <= Decimal::ZERO {
            return Err(TallyError::Validation(
                "expense amount must be positive".into(),
            ));
        }
        if draft.category.trim().is_empty() {
            return Err(TallyError::Validation(
                "expense category must not be empty".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut invoice = self.load(id).await?;
        let now = self.now();
        let expense = Expense {
            id: uuid::Uuid::new_v4().to_string(),
            amount: draft.amount,
            category: draft.category,
            description: draft.description,
            date: draft.date.unwrap_or_else(|| now.date_naive()),
        };
        let (expense_id, amount) = (expense.id.clone(), expense.amount);
        invoice.expenses.push(expense);
        invoice.total_expenses()?;
        invoice.updated_at = now;
        self.store.put(&invoice).await?;
        info!(
            invoice_id = %invoice.id,
            expense_id = %expense_id,
            amount = %amount,
            "expense added"
        );
        Ok(invoice)
    }

    /// Detach an expense by id.
    pub async fn remove_expense(
        &self,
        id: &InvoiceId,
        expense_id: &str,
    ) -> Result<Invoice, TallyError> {
        let _guard = self.write_lock.lock().await;
        let mut invoice = self.load(id).await?;
        let before = invoice.expenses.len();
        invoice.expenses.retain(|e| e.id != expense_id);
        if invoice.expenses.len() == before {
            return Err(TallyError::not_found(expense_id));
        }
        invoice.updated_at = self.now();
        self.store.put(&invoice).await?;
        info!(invoice_id = %invoice.id, expense_id, "expense removed");
        Ok(invoice)
    }

    pub async fn profitability(&self, id: &InvoiceId) -> Result<Profitability, TallyError> {
        Profitability::of(&self.load(id).await?)
    }
}
