//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval > 0, attempts >= 1)
//! - Check addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use crate::config::schema::AppConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field,
        message: message.into(),
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err(
            "server.bind_address",
            format!("not a valid socket address: {}", config.server.bind_address),
        ));
    }

    if config.store.path.is_empty() {
        errors.push(err("store.path", "must not be empty"));
    }

    if config.poller.interval_ms == 0 {
        errors.push(err("poller.interval_ms", "must be greater than zero"));
    }

    if config.poller.max_attempts == 0 {
        errors.push(err("poller.max_attempts", "must be at least 1"));
    }

    if config.poller.concurrency == 0 {
        errors.push(err("poller.concurrency", "must be at least 1"));
    }

    if config.ssh.connect_timeout_secs == 0 {
        errors.push(err("ssh.connect_timeout_secs", "must be greater than zero"));
    }

    if config.ssh.ready_timeout_secs == 0 {
        errors.push(err("ssh.ready_timeout_secs", "must be greater than zero"));
    }

    for ip in &config.security.allowed_ips {
        if ip.parse::<IpAddr>().is_err() {
            errors.push(err(
                "security.allowed_ips",
                format!("not a valid IP address: {ip}"),
            ));
        }
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

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = AppConfig::default();
        config.poller.interval_ms = 0;
        config.poller.max_attempts = 0;
        config.security.allowed_ips = vec!["not-an-ip".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
