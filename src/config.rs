//! Configuration loading and types for swiftmock.
//!
//! Configuration is read from an optional YAML file and deserialized into
//! the [`Config`] struct. Every section has defaults, so an empty file (or no
//! file at all) yields a working single-account server.

use anyhow::Context as _;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// The account seeded at startup.
    #[serde(default)]
    pub account: AccountConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observability settings (metrics + health probe).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL advertised in `X-Storage-Url`. Defaults to
    /// `http://127.0.0.1:<port>`.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Maximum object size in bytes (default 5 GiB).
    #[serde(default = "default_max_object_size")]
    pub max_object_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            max_object_size: default_max_object_size(),
        }
    }
}

impl ServerConfig {
    /// Base URL clients should use for storage requests, without a trailing
    /// slash.
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://127.0.0.1:{}", self.port),
        }
    }
}

/// Credentials of the single seeded account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Account name (the `<account>` in `/v1/AUTH_<account>`).
    #[serde(default = "default_account_name")]
    pub name: String,

    /// Shared secret checked by the credential exchange.
    #[serde(default = "default_account_password")]
    pub password: String,

    /// Pre-seeded `X-Account-Meta-Temp-Url-Key`.
    #[serde(default)]
    pub temp_url_key: Option<String>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            name: default_account_name(),
            password: default_account_password(),
            temp_url_key: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Observability settings.
///
/// Controls Prometheus metrics collection and the `/health` probe. Both are
/// enabled by default.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics collection and the `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics: bool,

    /// Enable the `/health` probe.
    #[serde(default = "default_true")]
    pub health_check: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics: true,
            health_check: true,
        }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_account_name() -> String {
    "tera".to_string()
}

fn default_account_password() -> String {
    "tera".to_string()
}

fn default_max_object_size() -> u64 {
    5_368_709_120 // 5 GiB
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.public_url(), "http://127.0.0.1:8080");
        assert_eq!(config.account.name, "tera");
        assert_eq!(config.account.password, "tera");
        assert!(config.account.temp_url_key.is_none());
        assert!(config.observability.metrics);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "server:\n  port: 9000\n  public_url: http://swift.test/\naccount:\n  temp_url_key: k3y\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.public_url(), "http://swift.test");
        assert_eq!(config.account.name, "tera");
        assert_eq!(config.account.temp_url_key.as_deref(), Some("k3y"));
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_example_file_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/swiftmock.example.yaml");
        let config = load_config(path).unwrap();
        assert_eq!(config.account.name, "tera");
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(load_config("/nonexistent/swiftmock.yaml").is_err());
    }
}
