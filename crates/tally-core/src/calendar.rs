// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar-month recurrence arithmetic.

use chrono::{DateTime, Months, Utc};

use crate::error::TallyError;

/// Shift `from` forward by `months` calendar months, keeping the time of day.
///
/// The day of month is preserved when the target month has it; otherwise it
/// clamps to the target month's last day (Jan 31 + 1 month = Feb 28 or 29).
pub fn add_months(from: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, TallyError> {
    from.checked_add_months(Months::new(months))
        .ok_or_else(|| TallyError::Internal(format!("date overflow adding {months} month(s) to {from}")))
}

/// Shorthand for [`add_months`] with one month.
pub fn next_month(from: DateTime<Utc>) -> Result<DateTime<Utc>, TallyError> {
    add_months(from, 1)
}
