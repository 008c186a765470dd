// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the invoice lifecycle engine.

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::{
    Clock, Discount, InvoiceDraft, InvoiceId, InvoiceStore, LineItemDraft, PaymentDetails,
    TallyError,
};
use tally_ledger::ExpenseDraft;
use tally_test_utils::{TestHarness, sample_draft};
use tracing_test::traced_test;

fn billed_draft() -> InvoiceDraft {
    InvoiceDraft {
        client: "Acme LLC".into(),
        client_phone: Some("8 (916) 123-45-67".into()),
        items: vec![
            LineItemDraft {
                name: "Hosting".into(),
                unit: "month".into(),
                quantity: dec!(2),
                price: dec!(1000),
            },
            LineItemDraft {
                name: "Backups".into(),
                unit: "month".into(),
                quantity: dec!(5),
                price: dec!(500),
            },
        ],
        discount: Some(Discount::Percent(dec!(10))),
        payment: Some(PaymentDetails {
            recipient: "Tally Studio".into(),
            bank_name: "Bank".into(),
            account: "40702810000000000001".into(),
            bic: "044525000".into(),
            correspondent_account: "30101810000000000000".into(),
            purpose: Some("Services".into()),
        }),
        auto_send_from: None,
    }
}

#[tokio::test]
async fn create_allocates_number_and_computes_total() {
    let h = TestHarness::builder().first_invoice_number(41).build();

    let outcome = h.lifecycle.create_invoice(billed_draft()).await.unwrap();
    assert!(outcome.warning.is_none());
    let invoice = outcome.invoice;
    assert_eq!(invoice.invoice_number, 41);
    assert_eq!(invoice.amount, dec!(4050));
    assert!(!invoice.paid);
    assert!(!invoice.auto_send_enabled);
    assert_eq!(h.documents.rendered().await, vec![41]);

    let fixed = InvoiceDraft {
        discount: Some(Discount::Fixed(dec!(1000))),
        ..billed_draft()
    };
    let second = h.lifecycle.create_invoice(fixed).await.unwrap().invoice;
    assert_eq!(second.invoice_number, 42);
    assert_eq!(second.amount, dec!(3500));
}

#[tokio::test]
async fn create_rejects_invalid_draft() {
    let h = TestHarness::new();
    let mut draft = billed_draft();
    draft.items.clear();
    let err = h.lifecycle.create_invoice(draft).await.unwrap_err();
    assert!(matches!(err, TallyError::Validation(_)));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn overflowing_amounts_are_rejected_not_panicking() {
    let h = TestHarness::new();
    let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
    let mut draft = billed_draft();
    draft.items[0].quantity = huge;
    draft.items[0].price = huge;

    let err = h.lifecycle.create_invoice(draft.clone()).await.unwrap_err();
    assert!(matches!(err, TallyError::Validation(_)), "got: {err}");
    assert!(h.store.is_empty().await);

    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;
    let err = h.lifecycle.update_invoice(&id, draft).await.unwrap_err();
    assert!(matches!(err, TallyError::Validation(_)), "got: {err}");
    assert_eq!(h.lifecycle.get_invoice(&id).await.unwrap().amount, dec!(4050));
}

#[tokio::test]
async fn render_failure_on_create_is_a_warning() {
    let h = TestHarness::new();
    h.documents.set_fail_render(true);
    let outcome = h.lifecycle.create_invoice(billed_draft()).await.unwrap();
    assert!(outcome.warning.is_some());
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn mark_paid_and_unpaid_keep_payment_invariant() {
    let h = TestHarness::new();
    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;

    let paid = h.lifecycle.mark_paid(&id).await.unwrap().invoice;
    assert!(paid.paid);
    assert_eq!(paid.paid_at, Some(h.clock.now()));

    let unpaid = h.lifecycle.mark_unpaid(&id).await.unwrap();
    assert!(!unpaid.paid);
    assert!(unpaid.paid_at.is_none());

    for invoice in h.store.list().await.unwrap() {
        assert_eq!(invoice.paid, invoice.paid_at.is_some());
    }
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let h = TestHarness::new();
    let missing = InvoiceId::from("nope");
    let now = h.clock.now();

    assert!(matches!(h.lifecycle.mark_paid(&missing).await, Err(TallyError::NotFound { .. })));
    assert!(matches!(h.lifecycle.mark_unpaid(&missing).await, Err(TallyError::NotFound { .. })));
    assert!(matches!(
        h.lifecycle.set_auto_send(&missing, true, Some(now)).await,
        Err(TallyError::NotFound { .. })
    ));
    assert!(matches!(
        h.lifecycle.advance_next_send_date(&missing, now).await,
        Err(TallyError::NotFound { .. })
    ));
    assert!(matches!(h.lifecycle.delete_invoice(&missing).await, Err(TallyError::NotFound { .. })));
}

#[tokio::test]
async fn paying_creates_one_armed_successor() {
    let h = TestHarness::builder().first_invoice_number(10).build();
    let source = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice;

    let outcome = h.lifecycle.mark_paid(&source.id).await.unwrap();
    assert!(outcome.warning.is_none());
    let dup = outcome.duplicate.expect("successor created");

    assert_ne!(dup.id, source.id);
    assert_eq!(dup.invoice_number, 11);
    assert_eq!(dup.client, source.client);
    assert_eq!(dup.client_phone, source.client_phone);
    assert_eq!(dup.items, source.items);
    assert_eq!(dup.discount, source.discount);
    assert_eq!(dup.payment, source.payment);
    assert_eq!(dup.amount, dec!(4050));
    assert!(!dup.paid);
    assert!(dup.auto_send_enabled);
    // Harness clock starts on 2026-01-31 09:00; one month later clamps to Feb 28.
    assert_eq!(
        dup.next_send_date,
        Some(Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap())
    );
    assert_eq!(h.documents.rendered().await, vec![10, 11]);

    // Paying again is a no-op.
    let again = h.lifecycle.mark_paid(&source.id).await.unwrap();
    assert!(again.duplicate.is_none());
    assert_eq!(h.store.len().await, 2);
}

#[tokio::test]
async fn each_unpaid_to_paid_edge_duplicates() {
    let h = TestHarness::new();
    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;

    assert!(h.lifecycle.mark_paid(&id).await.unwrap().duplicate.is_some());
    h.lifecycle.mark_unpaid(&id).await.unwrap();
    assert!(h.lifecycle.mark_paid(&id).await.unwrap().duplicate.is_some());
    assert_eq!(h.store.len().await, 3);
}

#[tokio::test]
async fn successor_takes_over_auto_send() {
    let h = TestHarness::new();
    let now = h.clock.now();
    let source = h
        .seed_due_invoice("Acme", Some("79160000000"), now)
        .await
        .unwrap();
    assert!(source.auto_send_enabled);

    let outcome = h.lifecycle.mark_paid(&source.id).await.unwrap();
    assert!(!outcome.invoice.auto_send_enabled);
    assert!(outcome.invoice.next_send_date.is_none());

    let stored = h.lifecycle.get_invoice(&source.id).await.unwrap();
    assert!(stored.paid);
    assert!(!stored.auto_send_enabled);
    assert!(outcome.duplicate.unwrap().auto_send_enabled);
}

#[traced_test]
#[tokio::test]
async fn duplication_failure_keeps_payment() {
    let h = TestHarness::new();
    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;
    h.allocator.set_failing(true);

    let outcome = h.lifecycle.mark_paid(&id).await.unwrap();
    assert!(outcome.invoice.paid);
    assert!(outcome.duplicate.is_none());
    let warning = outcome.warning.expect("warning reported");
    assert!(warning.contains("failed to duplicate"), "got: {warning}");

    assert!(h.lifecycle.get_invoice(&id).await.unwrap().paid);
    assert_eq!(h.store.len().await, 1);
    assert!(logs_contain("payment recorded but duplication failed"));
}

#[tokio::test]
async fn failed_handover_still_reports_stored_successor() {
    let h = TestHarness::new();
    let source = h
        .seed_due_invoice("Acme", Some("79160000000"), h.clock.now())
        .await
        .unwrap();
    // Paid flag and successor are written; disabling the source is not.
    h.store.fail_writes_after(2).await;

    let outcome = h.lifecycle.mark_paid(&source.id).await.unwrap();
    assert!(outcome.invoice.paid);
    let successor = outcome.duplicate.expect("stored successor is reported");
    let warning = outcome.warning.expect("handover warning");
    assert!(warning.contains("still enabled"), "got: {warning}");

    let stored = h.lifecycle.get_invoice(&successor.id).await.unwrap();
    assert!(stored.auto_send_enabled);
    let stored_source = h.lifecycle.get_invoice(&source.id).await.unwrap();
    assert!(stored_source.paid);
    assert!(stored_source.auto_send_enabled);
    assert_eq!(h.store.len().await, 2);
}

#[tokio::test]
async fn duplicate_persistence_failure_is_a_duplication_error() {
    let h = TestHarness::new();
    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;
    h.store.set_fail_writes(true);

    let err = h.lifecycle.on_payment_confirmed(&id).await.unwrap_err();
    assert!(matches!(err, TallyError::Duplication { .. }));
}

#[tokio::test]
async fn set_auto_send_overwrites_date_only_when_given() {
    let h = TestHarness::new();
    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;
    let first = Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap();

    let armed = h.lifecycle.set_auto_send(&id, true, Some(first)).await.unwrap();
    assert!(armed.auto_send_enabled);
    assert_eq!(armed.next_send_date, Some(first));

    let disabled = h.lifecycle.set_auto_send(&id, false, None).await.unwrap();
    assert!(!disabled.auto_send_enabled);
    assert_eq!(disabled.next_send_date, Some(first));

    // Past dates are accepted as-is.
    let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let rearmed = h.lifecycle.set_auto_send(&id, true, Some(past)).await.unwrap();
    assert_eq!(rearmed.next_send_date, Some(past));
}

#[tokio::test]
async fn due_set_boundaries() {
    let h = TestHarness::new();
    let now = h.clock.now();

    let early = h.seed_due_invoice("Early", Some("1"), now - Duration::seconds(1)).await.unwrap();
    let exact = h.seed_due_invoice("Exact", Some("2"), now).await.unwrap();
    h.seed_due_invoice("Late", Some("3"), now + Duration::seconds(1)).await.unwrap();
    let off = h.seed_due_invoice("Off", Some("4"), now - Duration::days(1)).await.unwrap();
    h.lifecycle.set_auto_send(&off.id, false, None).await.unwrap();

    let due: Vec<InvoiceId> = h
        .lifecycle
        .due_for_auto_send(now)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(due, vec![early.id, exact.id]);
}

#[tokio::test]
async fn advance_moves_one_calendar_month() {
    let h = TestHarness::new();
    let jan31 = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
    let invoice = h.seed_due_invoice("Acme", Some("7"), jan31).await.unwrap();
    let sent_at = jan31 + Duration::minutes(5);

    let advanced = h.lifecycle.advance_next_send_date(&invoice.id, sent_at).await.unwrap();
    assert_eq!(
        advanced.next_send_date,
        Some(Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap())
    );
    assert_eq!(advanced.last_sent_at, Some(sent_at));

    let again = h.lifecycle.advance_next_send_date(&invoice.id, sent_at).await.unwrap();
    assert_eq!(
        again.next_send_date,
        Some(Utc.with_ymd_and_hms(2026, 3, 28, 12, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn advance_without_date_is_unchanged() {
    let h = TestHarness::new();
    let invoice = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice;
    let now = h.clock.now();

    let same = h.lifecycle.advance_next_send_date(&invoice.id, now).await.unwrap();
    assert_eq!(same, invoice);
}

#[tokio::test]
async fn update_replaces_content_and_keeps_state() {
    let h = TestHarness::new();
    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;
    h.lifecycle.mark_paid(&id).await.unwrap();

    let updated = h
        .lifecycle
        .update_invoice(&id, sample_draft("Renamed", Some("79990000000")))
        .await
        .unwrap();
    assert_eq!(updated.client, "Renamed");
    assert_eq!(updated.amount, dec!(1000));
    assert!(updated.paid);
    assert!(updated.paid_at.is_some());
}

#[tokio::test]
async fn delete_removes_record() {
    let h = TestHarness::new();
    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;
    h.lifecycle.delete_invoice(&id).await.unwrap();
    assert!(matches!(h.lifecycle.get_invoice(&id).await, Err(TallyError::NotFound { .. })));
    assert!(h.lifecycle.list_invoices().await.unwrap().is_empty());
}

#[tokio::test]
async fn expenses_drive_profitability() {
    let h = TestHarness::new();
    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;

    let with_hosting = h
        .lifecycle
        .add_expense(
            &id,
            ExpenseDraft {
                amount: dec!(1000),
                category: "hosting".into(),
                description: "VPS".into(),
                date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(with_hosting.expenses.len(), 1);
    assert_eq!(with_hosting.expenses[0].date, h.clock.now().date_naive());

    let report = h.lifecycle.profitability(&id).await.unwrap();
    assert_eq!(report.amount, dec!(4050));
    assert_eq!(report.expenses, dec!(1000));
    assert_eq!(report.profit, dec!(3050));
    assert_eq!(report.margin_percent, Some(dec!(75.31)));

    let expense_id = with_hosting.expenses[0].id.clone();
    let cleared = h.lifecycle.remove_expense(&id, &expense_id).await.unwrap();
    assert!(cleared.expenses.is_empty());
    assert!(matches!(
        h.lifecycle.remove_expense(&id, &expense_id).await,
        Err(TallyError::NotFound { .. })
    ));
}

#[tokio::test]
async fn non_positive_expense_is_rejected() {
    let h = TestHarness::new();
    let id = h.lifecycle.create_invoice(billed_draft()).await.unwrap().invoice.id;
    let err = h
        .lifecycle
        .add_expense(
            &id,
            ExpenseDraft {
                amount: dec!(0),
                category: "misc".into(),
                description: String::new(),
                date: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::Validation(_)));
}
