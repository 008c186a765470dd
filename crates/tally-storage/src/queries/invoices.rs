// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice record CRUD.
//!
//! Each row stores the full record as JSON in `payload`. `invoice_number`,
//! `paid`, `auto_send_enabled` and `next_send_date` are mirrored into their
//! own columns so the due query and ordering run on indexes. The send date is
//! mirrored as epoch microseconds, which order correctly for every year.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use tally_core::{Invoice, InvoiceId, TallyError};

use crate::database::{Database, map_tr_err};

pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Sort key for the due query.
pub(crate) fn send_key(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn decode_payload(payload: String) -> rusqlite::Result<Invoice> {
    serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Insert or replace an invoice.
pub async fn upsert_invoice(db: &Database, invoice: &Invoice) -> Result<(), TallyError> {
    let payload = serde_json::to_string(invoice).map_err(|e| TallyError::Storage {
        source: Box::new(e),
    })?;
    let id = invoice.id.0.clone();
    let number = invoice.invoice_number;
    let paid = invoice.paid;
    let auto_send = invoice.auto_send_enabled;
    let next_send = invoice.next_send_date.map(send_key);
    let created_at = encode_ts(invoice.created_at);
    let updated_at = encode_ts(invoice.updated_at);

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO invoices
                     (id, invoice_number, paid, auto_send_enabled, next_send_at,
                      payload, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                     invoice_number = excluded.invoice_number,
                     paid = excluded.paid,
                     auto_send_enabled = excluded.auto_send_enabled,
                     next_send_at = excluded.next_send_at,
                     payload = excluded.payload,
                     updated_at = excluded.updated_at",
                params![id, number, paid, auto_send, next_send, payload, created_at, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get an invoice by id.
pub async fn get_invoice(db: &Database, id: &InvoiceId) -> Result<Option<Invoice>, TallyError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT payload FROM invoices WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(payload) => decode_payload(payload).map(Some),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// All invoices ordered by invoice number.
pub async fn list_invoices(db: &Database) -> Result<Vec<Invoice>, TallyError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT payload FROM invoices ORDER BY invoice_number, id")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.map(|payload| decode_payload(payload?)).collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Invoices with auto-send enabled and `next_send_date <= now`.
pub async fn list_due(db: &Database, now: DateTime<Utc>) -> Result<Vec<Invoice>, TallyError> {
    let now = send_key(now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT payload FROM invoices
                 WHERE auto_send_enabled = 1
                   AND next_send_at IS NOT NULL
                   AND next_send_at <= ?1
                 ORDER BY next_send_at, invoice_number",
            )?;
            let rows = stmt.query_map(params![now], |row| row.get::<_, String>(0))?;
            rows.map(|payload| decode_payload(payload?)).collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an invoice. Returns `true` when a row was removed.
pub async fn delete_invoice(db: &Database, id: &InvoiceId) -> Result<bool, TallyError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute("DELETE FROM invoices WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Count of stored invoices.
pub async fn count_invoices(db: &Database) -> Result<i64, TallyError> {
    db.connection()
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM invoices", [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use tally_core::{InvoiceDraft, LineItemDraft};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_invoice(number: i64) -> Invoice {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        let draft = InvoiceDraft {
            client: format!("Client {number}"),
            client_phone: Some("89161234567".into()),
            items: vec![LineItemDraft {
                name: "Support".into(),
                unit: "hour".into(),
                quantity: dec!(3),
                price: dec!(1500),
            }],
            discount: None,
            payment: None,
            auto_send_from: None,
        };
        Invoice::from_draft(number, draft, now).unwrap()
    }

    #[tokio::test]
    async fn upsert_and_get_roundtrips() {
        let (db, _dir) = setup_db().await;
        let invoice = make_invoice(1);

        upsert_invoice(&db, &invoice).await.unwrap();
        let retrieved = get_invoice(&db, &invoice.id).await.unwrap().unwrap();
        assert_eq!(retrieved, invoice);
        assert_eq!(retrieved.amount, dec!(4500));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = get_invoice(&db, &InvoiceId::from("missing")).await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let (db, _dir) = setup_db().await;
        let mut invoice = make_invoice(5);
        upsert_invoice(&db, &invoice).await.unwrap();

        invoice.client = "Renamed".into();
        invoice.paid = true;
        invoice.paid_at = Some(invoice.created_at);
        upsert_invoice(&db, &invoice).await.unwrap();

        assert_eq!(count_invoices(&db).await.unwrap(), 1);
        let retrieved = get_invoice(&db, &invoice.id).await.unwrap().unwrap();
        assert_eq!(retrieved.client, "Renamed");
        assert!(retrieved.paid);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_is_ordered_by_number() {
        let (db, _dir) = setup_db().await;
        for number in [3, 1, 2] {
            upsert_invoice(&db, &make_invoice(number)).await.unwrap();
        }
        let numbers: Vec<i64> = list_invoices(&db)
            .await
            .unwrap()
            .iter()
            .map(|i| i.invoice_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_due_respects_boundary_and_flag() {
        let (db, _dir) = setup_db().await;
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();

        let mut past = make_invoice(1);
        past.auto_send_enabled = true;
        past.next_send_date = Some(now - Duration::seconds(1));
        let mut exact = make_invoice(2);
        exact.auto_send_enabled = true;
        exact.next_send_date = Some(now);
        let mut future = make_invoice(3);
        future.auto_send_enabled = true;
        future.next_send_date = Some(now + Duration::seconds(1));
        let mut disabled = make_invoice(4);
        disabled.next_send_date = Some(now - Duration::days(3));

        for invoice in [&future, &exact, &disabled, &past] {
            upsert_invoice(&db, invoice).await.unwrap();
        }

        let due: Vec<i64> = list_due(&db, now)
            .await
            .unwrap()
            .iter()
            .map(|i| i.invoice_number)
            .collect();
        assert_eq!(due, vec![1, 2]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let (db, _dir) = setup_db().await;
        let invoice = make_invoice(9);
        upsert_invoice(&db, &invoice).await.unwrap();

        assert!(delete_invoice(&db, &invoice.id).await.unwrap());
        assert!(!delete_invoice(&db, &invoice.id).await.unwrap());
        assert!(get_invoice(&db, &invoice.id).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[test]
    fn send_keys_sort_chronologically_past_year_9999() {
        let a = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        assert!(send_key(a) < send_key(b));
        assert_eq!(encode_ts(a), "2026-09-01T00:00:00.000000Z");
    }

    #[tokio::test]
    async fn far_future_send_date_is_not_due() {
        let (db, _dir) = setup_db().await;
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut far = make_invoice(1);
        far.auto_send_enabled = true;
        far.next_send_date = Some(Utc.with_ymd_and_hms(10000, 1, 31, 9, 0, 0).unwrap());
        let mut due = make_invoice(2);
        due.auto_send_enabled = true;
        due.next_send_date = Some(now);
        upsert_invoice(&db, &far).await.unwrap();
        upsert_invoice(&db, &due).await.unwrap();

        let found = list_due(&db, now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due.id);
        db.close().await.unwrap();
    }
}
