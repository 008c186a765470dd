// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tally status` command implementation.
//!
//! Asks a running `tally serve` for its scheduler status through the
//! gateway. Reports "not running" when the gateway cannot be reached.

use std::io::IsTerminal;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_config::TallyConfig;
use tally_core::TallyError;

/// The parts of the gateway's dispatch status this command shows.
#[derive(Debug, Deserialize)]
struct RemoteStatus {
    timer_active: bool,
    pass_running: bool,
    due_count: usize,
    last_pass: Option<RemotePass>,
}

#[derive(Debug, Deserialize)]
struct RemotePass {
    finished_at: DateTime<Utc>,
    sent: Vec<serde_json::Value>,
    failures: Vec<serde_json::Value>,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub timer_active: Option<bool>,
    pub pass_running: Option<bool>,
    pub due_count: Option<usize>,
    pub last_pass_finished_at: Option<DateTime<Utc>>,
    pub last_pass_sent: Option<usize>,
    pub last_pass_failed: Option<usize>,
    pub gateway_url: String,
}

impl StatusResponse {
    fn offline(gateway_url: String) -> Self {
        Self {
            running: false,
            timer_active: None,
            pass_running: None,
            due_count: None,
            last_pass_finished_at: None,
            last_pass_sent: None,
            last_pass_failed: None,
            gateway_url,
        }
    }

    fn from_remote(remote: RemoteStatus, gateway_url: String) -> Self {
        Self {
            running: true,
            timer_active: Some(remote.timer_active),
            pass_running: Some(remote.pass_running),
            due_count: Some(remote.due_count),
            last_pass_finished_at: remote.last_pass.as_ref().map(|p| p.finished_at),
            last_pass_sent: remote.last_pass.as_ref().map(|p| p.sent.len()),
            last_pass_failed: remote.last_pass.as_ref().map(|p| p.failures.len()),
            gateway_url,
        }
    }
}

/// Run `tally status`.
pub async fn run_status(config: &TallyConfig, json: bool, plain: bool) -> Result<(), TallyError> {
    let gateway_url = format!("http://{}:{}", config.gateway.host, config.gateway.port);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| TallyError::Internal(format!("failed to create HTTP client: {e}")))?;

    let mut request = client.get(format!("{gateway_url}/v1/auto-send/status"));
    if let Some(token) = &config.gateway.bearer_token {
        request = request.bearer_auth(token);
    }

    let status = match request.send().await {
        Ok(resp) if resp.status().is_success() => {
            let remote: RemoteStatus = resp.json().await.map_err(|e| {
                TallyError::Internal(format!("failed to parse status response: {e}"))
            })?;
            StatusResponse::from_remote(remote, gateway_url)
        }
        Ok(resp) => {
            tracing::debug!(status = %resp.status(), "gateway refused status request");
            StatusResponse::offline(gateway_url)
        }
        Err(e) => {
            tracing::debug!(error = %e, "gateway unreachable");
            StatusResponse::offline(gateway_url)
        }
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&status, use_color);
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  tally status");
    println!("  {}", "-".repeat(35));

    if !status.running {
        if use_color {
            println!("    State:    {} {}", "✗".red(), "not running".red());
        } else {
            println!("    State:    [FAIL] not running");
        }
        println!("    Endpoint: {}", status.gateway_url);
        println!();
        println!("  Start with: tally serve (with [gateway] enabled)");
        println!();
        return;
    }

    let timer = if status.timer_active == Some(true) {
        "active"
    } else {
        "stopped"
    };
    if use_color {
        println!("    State:    {} running (timer {timer})", "✓".green());
    } else {
        println!("    State:    [OK] running (timer {timer})");
    }
    if status.pass_running == Some(true) {
        println!("    Pass:     in progress");
    }
    println!("    Due now:  {}", status.due_count.unwrap_or(0));
    match status.last_pass_finished_at {
        Some(at) => println!(
            "    Last:     {} ({} sent, {} failed)",
            at.to_rfc3339(),
            status.last_pass_sent.unwrap_or(0),
            status.last_pass_failed.unwrap_or(0)
        ),
        None => println!("    Last:     no pass yet"),
    }
    println!();
}
