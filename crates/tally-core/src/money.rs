// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice arithmetic: line amounts, discounts, and totals.
//!
//! All math is exact decimal and checked: a result outside the `Decimal`
//! range is a validation error, not a panic. Totals are not clamped, so a
//! fixed discount larger than the subtotal produces a negative total.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::TallyError;
use crate::types::{Discount, LineItem};

fn overflow(what: &str) -> TallyError {
    TallyError::Validation(format!("{what} is out of the representable range"))
}

/// Breakdown of an invoice total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// `quantity * price` for one line.
pub fn line_amount(quantity: Decimal, price: Decimal) -> Result<Decimal, TallyError> {
    quantity
        .checked_mul(price)
        .ok_or_else(|| overflow("line amount"))
}

/// Sum `amounts`, failing instead of overflowing.
pub fn checked_sum(
    amounts: impl IntoIterator<Item = Decimal>,
    what: &str,
) -> Result<Decimal, TallyError> {
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount).ok_or_else(|| overflow(what))
    })
}

impl Discount {
    /// The amount this discount removes from `subtotal`.
    pub fn amount_for(&self, subtotal: Decimal) -> Result<Decimal, TallyError> {
        match *self {
            Discount::Percent(value) => subtotal
                .checked_mul(value)
                .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(|| overflow("discount")),
            Discount::Fixed(value) => Ok(value),
        }
    }

    /// Whether the discount value is within its allowed range.
    pub fn is_valid(&self) -> bool {
        match *self {
            Discount::Percent(value) => value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED,
            Discount::Fixed(value) => value >= Decimal::ZERO,
        }
    }
}

/// Compute subtotal, discount and total.
///
/// Line amounts are recomputed from quantity and price rather than read from
/// the stored `amount` field.
pub fn compute_totals(
    items: &[LineItem],
    discount: Option<&Discount>,
) -> Result<Totals, TallyError> {
    let amounts = items
        .iter()
        .map(|item| line_amount(item.quantity, item.price))
        .collect::<Result<Vec<_>, _>>()?;
    let subtotal = checked_sum(amounts, "subtotal")?;
    let discount = match discount {
        Some(d) => d.amount_for(subtotal)?,
        None => Decimal::ZERO,
    };
    let total = subtotal
        .checked_sub(discount)
        .ok_or_else(|| overflow("total"))?;
    Ok(Totals {
        subtotal,
        discount,
        total,
    })
}

/// Render an amount with exactly two decimal places.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}
