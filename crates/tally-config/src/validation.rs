// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::TallyConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &TallyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        fail(format!(
            "app.log_level `{}` must be one of {}",
            config.app.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.storage.first_invoice_number < 1 {
        fail(format!(
            "storage.first_invoice_number must be at least 1, got {}",
            config.storage.first_invoice_number
        ));
    }

    if config.documents.dir.trim().is_empty() {
        fail("documents.dir must not be empty".to_string());
    }

    if config.dispatch.check_interval_secs == 0 {
        fail("dispatch.check_interval_secs must be greater than 0".to_string());
    }

    if !config.whatsapp.bridge_url.starts_with("http://")
        && !config.whatsapp.bridge_url.starts_with("https://")
    {
        fail(format!(
            "whatsapp.bridge_url `{}` must start with http:// or https://",
            config.whatsapp.bridge_url
        ));
    }

    if config.whatsapp.timeout_secs == 0 {
        fail("whatsapp.timeout_secs must be greater than 0".to_string());
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!("gateway.host `{host}` is not a valid IP address or hostname"));
        }
    }

    if config.gateway.enabled
        && config
            .gateway
            .bearer_token
            .as_deref()
            .is_none_or(|t| t.trim().is_empty())
    {
        fail("gateway.bearer_token is required when gateway.enabled = true".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&TallyConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = TallyConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn zero_check_interval_fails_validation() {
        let mut config = TallyConfig::default();
        config.dispatch.check_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "check_interval_secs"));
    }

    #[test]
    fn zero_send_delay_is_allowed() {
        let mut config = TallyConfig::default();
        config.dispatch.send_delay_secs = 0;
        config.dispatch.initial_delay_secs = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn gateway_without_token_fails_validation() {
        let mut config = TallyConfig::default();
        config.gateway.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "bearer_token"));

        config.gateway.bearer_token = Some("secret".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn bad_bridge_url_and_log_level_both_reported() {
        let mut config = TallyConfig::default();
        config.whatsapp.bridge_url = "localhost:3001".to_string();
        config.app.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_message(&errors, "bridge_url"));
        assert!(has_message(&errors, "log_level"));
    }

    #[test]
    fn invalid_gateway_host_fails_validation() {
        let mut config = TallyConfig::default();
        config.gateway.host = "not a host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "gateway.host"));
    }
}
