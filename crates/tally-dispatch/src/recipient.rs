// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalization for recipients.

use tally_core::{Invoice, Recipient, TallyError};

/// Reduce a free-form phone number to country-coded digits.
///
/// Non-digits are stripped, a leading `8` becomes `7`, and `7` is prepended
/// when the result does not already start with it. Returns `None` when no
/// digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if digits.starts_with('8') {
        digits.replace_range(..1, "7");
    }
    if !digits.starts_with('7') {
        digits.insert(0, '7');
    }
    Some(digits)
}

/// The normalized recipient for `invoice`, or `MissingRecipient`.
pub fn recipient_for(invoice: &Invoice) -> Result<Recipient, TallyError> {
    invoice
        .client_phone
        .as_deref()
        .and_then(normalize_phone)
        .map(Recipient)
        .ok_or(TallyError::MissingRecipient {
            invoice_number: invoice.invoice_number,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formatted_international_number() {
        assert_eq!(normalize_phone("+7 (916) 123-45-67").as_deref(), Some("79161234567"));
    }

    #[test]
    fn leading_eight_becomes_seven() {
        assert_eq!(normalize_phone("8 916 123 45 67").as_deref(), Some("79161234567"));
    }

    #[test]
    fn bare_local_number_gets_country_code() {
        assert_eq!(normalize_phone("9161234567").as_deref(), Some("79161234567"));
    }

    #[test]
    fn no_digits_is_none() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("n/a"), None);
    }

    #[test]
    fn missing_phone_is_missing_recipient() {
        let mut invoice =
            tally_core::Invoice::from_draft(12, Default::default(), chrono::Utc::now()).unwrap();
        invoice.client_phone = None;
        assert!(matches!(
            recipient_for(&invoice),
            Err(TallyError::MissingRecipient { invoice_number: 12 })
        ));

        invoice.client_phone = Some("---".into());
        assert!(recipient_for(&invoice).is_err());

        invoice.client_phone = Some("89160000000".into());
        assert_eq!(recipient_for(&invoice).unwrap(), Recipient("79160000000".into()));
    }

    proptest! {
        #[test]
        fn normalized_is_digits_starting_with_seven(raw in "[0-9 ()+-]{0,20}") {
            if let Some(n) = normalize_phone(&raw) {
                prop_assert!(n.starts_with('7'));
                prop_assert!(n.chars().all(|c| c.is_ascii_digit()));
            }
        }

        #[test]
        fn normalization_is_idempotent(raw in "[0-9 ()+-]{1,20}") {
            if let Some(once) = normalize_phone(&raw) {
                prop_assert_eq!(normalize_phone(&once), Some(once.clone()));
            }
        }
    }
}
