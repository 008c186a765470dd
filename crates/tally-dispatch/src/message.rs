// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text sent alongside a recurring invoice document.

use tally_core::Invoice;
use tally_core::money::format_amount;

/// Caption naming the invoice number, client, and amount due.
pub fn compose_caption(invoice: &Invoice) -> String {
    format!(
        "Invoice No. {}\nClient: {}\nAmount due: {}",
        invoice.invoice_number,
        invoice.client,
        format_amount(invoice.amount)
    )
}
