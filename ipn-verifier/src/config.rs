//! Configuration module for environment variable parsing.
//!
//! Reads the listener port and the verifier settings from environment variables.

use std::env;
use tracing::warn;

/// Default number of seconds allowed for reaching PayPal and reading its verdict.
pub const DEFAULT_CONNECTION_TIMEOUT_SECONDS: u64 = 120;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Accept notifications flagged with `test_ipn` and verify them against the sandbox
    pub allow_test_notifications: bool,

    /// Timeout in seconds for the connection to PayPal and the verdict exchange
    pub connection_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            allow_test_notifications: false,
            connection_timeout_seconds: DEFAULT_CONNECTION_TIMEOUT_SECONDS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),

            allow_test_notifications: parse_bool(
                "IPN_ALLOW_TEST_NOTIFICATIONS",
                defaults.allow_test_notifications,
            ),

            connection_timeout_seconds: parse_timeout(
                "IPN_CONNECTION_TIMEOUT_SECONDS",
                defaults.connection_timeout_seconds,
            ),
        }
    }
}

/// Parse a boolean flag such as "true", "1", "off".
fn parse_bool(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean value, using default");
            default
        }
    }
}

/// Parse a strictly positive number of seconds.
fn parse_timeout(name: &str, default: u64) -> u64 {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid timeout value, using default");
            default
        }
    }
}
