//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; unset runs on a seeded in-memory store
/// - `DB_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `DB_ACQUIRE_TIMEOUT_SECS`: pool acquire timeout (default: `5`)
/// - `REQUIRE_LOGIN_FOR_CHECKOUT`: reject guest checkout (default: `false`)
/// - `SESSION_SECURE_COOKIE`: mark the session cookie `Secure` (default: `false`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub require_login_for_checkout: bool,
    pub secure_cookies: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref().map(str::trim) {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_max_connections: parse_var::<u32>(&lookup, "DB_MAX_CONNECTIONS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.db_max_connections),
            db_acquire_timeout: parse_var(&lookup, "DB_ACQUIRE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.db_acquire_timeout),
            require_login_for_checkout: lookup("REQUIRE_LOGIN_FOR_CHECKOUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.require_login_for_checkout),
            secure_cookies: lookup("SESSION_SECURE_COOKIE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.secure_cookies),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            db_max_connections: 10,
            db_acquire_timeout: Duration::from_secs(5),
            require_login_for_checkout: false,
            secure_cookies: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert_eq!(config.db_max_connections, 10);
        assert!(!config.require_login_for_checkout);
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(5));
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_reads_every_variable() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("RUST_LOG", "debug"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/trendify"),
            ("DB_MAX_CONNECTIONS", "25"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "2"),
            ("REQUIRE_LOGIN_FOR_CHECKOUT", "true"),
            ("SESSION_SECURE_COOKIE", "1"),
        ]);
        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/trendify")
        );
        assert_eq!(config.db_max_connections, 25);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(2));
        assert!(config.require_login_for_checkout);
        assert!(config.secure_cookies);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "eighty"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("DATABASE_URL", "  "),
            ("REQUIRE_LOGIN_FOR_CHECKOUT", "maybe"),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_max_connections, 10);
        assert!(config.database_url.is_none());
        assert!(!config.require_login_for_checkout);
    }
}
