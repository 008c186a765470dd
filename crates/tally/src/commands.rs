// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands that work directly on the local database.

use tally_config::TallyConfig;
use tally_core::{Clock, Invoice, PluginAdapter, SystemClock, TallyError};
use tally_core::money::format_amount;
use tally_dispatch::PassOutcome;

use crate::wiring::build_services;

/// `tally due`: list invoices whose recurring send is due now.
pub async fn run_due(config: &TallyConfig, json: bool) -> Result<(), TallyError> {
    let services = build_services(config).await?;
    let due = services
        .lifecycle
        .due_for_auto_send(SystemClock.now())
        .await?;

    if json {
        println!("{}", to_json(&due)?);
    } else if due.is_empty() {
        println!("no invoices due");
    } else {
        for invoice in &due {
            println!("{}", due_line(invoice));
        }
    }

    services.store.shutdown().await
}

/// `tally dispatch`: run one dispatch pass in the foreground and print its report.
///
/// Respects the configured send delay between invoices.
pub async fn run_dispatch(config: &TallyConfig) -> Result<(), TallyError> {
    let services = build_services(config).await?;
    let outcome = services.dispatcher.run_pass(SystemClock.now()).await?;

    match &outcome {
        PassOutcome::Completed(report) => tracing::info!(
            due = report.due,
            sent = report.sent.len(),
            failed = report.failures.len(),
            "manual dispatch finished"
        ),
        PassOutcome::AlreadyRunning => tracing::info!("dispatch pass already running"),
    }
    println!("{}", to_json(&outcome)?);

    services.store.shutdown().await
}

/// `tally config`: print the effective configuration with secrets masked.
pub fn run_config(config: &TallyConfig) -> Result<(), TallyError> {
    let rendered = toml::to_string_pretty(&redacted(config))
        .map_err(|e| TallyError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

fn redacted(config: &TallyConfig) -> TallyConfig {
    let mut shown = config.clone();
    let mask = |secret: &mut Option<String>| {
        if secret.is_some() {
            *secret = Some("[redacted]".to_string());
        }
    };
    mask(&mut shown.whatsapp.api_token);
    mask(&mut shown.gateway.bearer_token);
    shown
}

fn due_line(invoice: &Invoice) -> String {
    let next = invoice
        .next_send_date
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "#{:<6} {:<24} {:>12}  due {}  {}",
        invoice.invoice_number,
        invoice.client,
        format_amount(invoice.amount),
        next,
        invoice.client_phone.as_deref().unwrap_or("(no phone)")
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, TallyError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TallyError::Internal(format!("failed to serialize output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tally_core::{InvoiceDraft, LineItemDraft};

    #[test]
    fn redaction_masks_only_present_secrets() {
        let mut config = TallyConfig::default();
        config.gateway.bearer_token = Some("gw-secret".into());
        let shown = redacted(&config);
        assert_eq!(shown.gateway.bearer_token.as_deref(), Some("[redacted]"));
        assert!(shown.whatsapp.api_token.is_none());

        let rendered = toml::to_string_pretty(&shown).unwrap();
        assert!(!rendered.contains("gw-secret"));
    }

    #[test]
    fn due_line_shows_number_client_and_amount() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let draft = InvoiceDraft {
            client: "Acme".into(),
            client_phone: Some("79160000000".into()),
            items: vec![LineItemDraft {
                name: "Hosting".into(),
                unit: "month".into(),
                quantity: dec!(1),
                price: dec!(1500),
            }],
            auto_send_from: Some(now),
            ..Default::default()
        };
        let line = due_line(&Invoice::from_draft(12, draft, now).unwrap());
        assert!(line.starts_with("#12"));
        assert!(line.contains("Acme"));
        assert!(line.contains("1500.00"));
        assert!(line.contains("2026-03-01 10:00"));
    }
}
