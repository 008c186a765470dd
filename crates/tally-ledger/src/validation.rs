// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input checks for drafts supplied by callers.

use rust_decimal::Decimal;
use tally_core::money::compute_totals;
use tally_core::{InvoiceDraft, LineItemDraft, TallyError};

/// Reject drafts that cannot produce a meaningful invoice.
///
/// Negative totals from large fixed discounts are allowed.
pub fn validate_draft(draft: &InvoiceDraft) -> Result<(), TallyError> {
    if draft.client.trim().is_empty() {
        return Err(TallyError::Validation("client must not be empty".into()));
    }
    if draft.items.is_empty() {
        return Err(TallyError::Validation(
            "an invoice needs at least one line item".into(),
        ));
    }
    for (index, item) in draft.items.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(TallyError::Validation(format!(
                "item {} has an empty name",
                index + 1
            )));
        }
        if item.quantity <= Decimal::ZERO {
            return Err(TallyError::Validation(format!(
                "item `{}` must have a positive quantity",
                item.name
            )));
        }
        if item.price < Decimal::ZERO {
            return Err(TallyError::Validation(format!(
                "item `{}` has a negative price",
                item.name
            )));
        }
    }
    if let Some(discount) = &draft.discount
        && !discount.is_valid()
    {
        return Err(TallyError::Validation(format!(
            "discount {discount:?} is out of range"
        )));
    }
    let items = LineItemDraft::build_all(draft.items.clone())?;
    compute_totals(&items, draft.discount.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_core::{Discount, LineItemDraft};

    fn draft() -> InvoiceDraft {
        InvoiceDraft {
            client: "Acme".into(),
            items: vec![LineItemDraft {
                name: "Work".into(),
                unit: "h".into(),
                quantity: dec!(1),
                price: dec!(100),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn accepts_plain_draft() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn rejects_blank_client() {
        let mut d = draft();
        d.client = "  ".into();
        assert!(matches!(validate_draft(&d), Err(TallyError::Validation(_))));
    }

    #[test]
    fn rejects_empty_items() {
        let mut d = draft();
        d.items.clear();
        assert!(matches!(validate_draft(&d), Err(TallyError::Validation(_))));
    }

    #[test]
    fn rejects_zero_quantity() {
        let mut d = draft();
        d.items[0].quantity = dec!(0);
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn rejects_percent_over_hundred() {
        let mut d = draft();
        d.discount = Some(Discount::Percent(dec!(120)));
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn rejects_total_outside_decimal_range() {
        let mut d = draft();
        d.items[0].quantity = Decimal::MAX;
        d.items[0].price = dec!(2);
        assert!(matches!(validate_draft(&d), Err(TallyError::Validation(_))));
    }

    #[test]
    fn allows_fixed_discount_above_subtotal() {
        let mut d = draft();
        d.discount = Some(Discount::Fixed(dec!(5000)));
        assert!(validate_draft(&d).is_ok());
    }
}
