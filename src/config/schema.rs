//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the VPN fleet monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP API listener configuration.
    pub server: ServerConfig,

    /// Roster store settings.
    pub store: StoreConfig,

    /// API key and IP whitelist settings.
    pub security: SecurityConfig,

    /// Polling scheduler settings.
    pub poller: PollerConfig,

    /// SSH transport settings.
    pub ssh: SshConfig,
}

/// HTTP API listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:4000").
    pub bind_address: String,

    /// Request timeout in seconds for the API.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Roster store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path. `:memory:` is accepted for ephemeral runs.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "vpnwatch.db".to_string(),
        }
    }
}

/// Security configuration for the protected API surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// API key required on protected routes (x-api-key header).
    pub api_key: String,

    /// Client IPs allowed to reach protected routes.
    pub allowed_ips: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            allowed_ips: vec!["127.0.0.1".to_string(), "::1".to_string()],
        }
    }
}

/// Polling scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Polling period in milliseconds.
    pub interval_ms: u64,

    /// Whether the scheduler auto-starts on process init.
    /// Operator start/stop calls work regardless of this flag.
    pub enabled: bool,

    /// Total SSH attempts per target per cycle.
    pub max_attempts: u32,

    /// Backoff unit in milliseconds; attempt k waits `base_delay_ms * k`.
    pub base_delay_ms: u64,

    /// Maximum simultaneous SSH fetches within one cycle.
    pub concurrency: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 2_000,
            concurrency: 10,
        }
    }
}

/// SSH transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SshConfig {
    /// TCP connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Timeout for the session to become ready (auth + channel) in seconds.
    pub ready_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            ready_timeout_secs: 20,
        }
    }
}
