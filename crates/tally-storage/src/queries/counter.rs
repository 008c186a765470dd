// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice number counter.

use rusqlite::{OptionalExtension, params};
use tally_core::TallyError;

use crate::database::{Database, map_tr_err};

/// Atomically reserve the next invoice number.
///
/// The result is strictly greater than the last reserved number, greater
/// than every stored `invoice_number`, and at least `first_number`.
pub async fn reserve_next(db: &Database, first_number: i64) -> Result<i64, TallyError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let last: Option<i64> = tx
                .query_row(
                    "SELECT last_number FROM invoice_counter WHERE id = 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            let max_stored: Option<i64> =
                tx.query_row("SELECT MAX(invoice_number) FROM invoices", [], |row| {
                    row.get(0)
                })?;

            let floor = first_number - 1;
            let next = last
                .unwrap_or(floor)
                .max(max_stored.unwrap_or(floor))
                .max(floor)
                + 1;

            tx.execute(
                "INSERT INTO invoice_counter (id, last_number) VALUES (1, ?1)
                 ON CONFLICT(id) DO UPDATE SET last_number = excluded.last_number",
                params![next],
            )?;
            tx.commit()?;
            Ok(next)
        })
        .await
        .map_err(map_tr_err)
}

/// The last reserved number, if any has been handed out.
pub async fn last_reserved(db: &Database) -> Result<Option<i64>, TallyError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT last_number FROM invoice_counter WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
