// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Tally.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Tally configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Invoice database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Where rendered invoice documents live.
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Recurring auto-send scheduler settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// WhatsApp bridge delivery channel settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// HTTP API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in logs and status output.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "tally".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Number handed out to the very first invoice.
    #[serde(default = "default_first_invoice_number")]
    pub first_invoice_number: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            first_invoice_number: default_first_invoice_number(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tally").join("tally.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tally.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_first_invoice_number() -> i64 {
    1
}

/// Rendered document lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentsConfig {
    /// Directory holding one rendered PDF per invoice.
    #[serde(default = "default_documents_dir")]
    pub dir: String,

    /// File name prefix; documents are named `<prefix><number>.pdf`.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: default_documents_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_documents_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("tally").join("invoices"))
        .unwrap_or_else(|| std::path::PathBuf::from("invoices"))
        .to_string_lossy()
        .into_owned()
}

fn default_file_prefix() -> String {
    "invoice_".to_string()
}

/// Recurring dispatch scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Start the recurring scheduler with `tally serve`.
    #[serde(default = "default_dispatch_enabled")]
    pub enabled: bool,

    /// Poll period between due-invoice checks, in seconds.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Pause between consecutive sends within one pass, in seconds.
    #[serde(default = "default_send_delay_secs")]
    pub send_delay_secs: u64,

    /// Delay before the first check after startup, in seconds.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
}

impl DispatchConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_secs(self.send_delay_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_dispatch_enabled(),
            check_interval_secs: default_check_interval_secs(),
            send_delay_secs: default_send_delay_secs(),
            initial_delay_secs: default_initial_delay_secs(),
        }
    }
}

fn default_dispatch_enabled() -> bool {
    true
}

fn default_check_interval_secs() -> u64 {
    600 // 10 minutes
}

fn default_send_delay_secs() -> u64 {
    600 // 10 minutes
}

fn default_initial_delay_secs() -> u64 {
    60
}

/// WhatsApp Web bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Base URL of the bridge process that owns the browser session.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Bearer token expected by the bridge. `None` sends no auth header.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout in seconds. Sends with attachments can be slow.
    #[serde(default = "default_whatsapp_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            api_token: None,
            timeout_secs: default_whatsapp_timeout_secs(),
        }
    }
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:3001".to_string()
}

fn default_whatsapp_timeout_secs() -> u64 {
    120
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Serve the HTTP API with `tally serve`.
    #[serde(default)]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on `/v1` routes.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3080
}
