//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Cache TTLs are not configured here; they live in the cache policy table.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Whether each entry gets its own expiry timer in addition to lazy expiry
    pub proactive_expiry: bool,
    /// Whether to load demo posts and users into the in-memory store at startup
    pub seed_demo_data: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 30)
    /// - `PROACTIVE_EXPIRY` - Per-entry expiry timers (default: true)
    /// - `SEED_DEMO_DATA` - Seed demo content (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or(defaults.cleanup_interval),
            proactive_expiry: env::var("PROACTIVE_EXPIRY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.proactive_expiry),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.seed_demo_data),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 30,
            proactive_expiry: true,
            seed_demo_data: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 30);
        assert!(config.proactive_expiry);
        assert!(config.seed_demo_data);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("PROACTIVE_EXPIRY");
        env::remove_var("SEED_DEMO_DATA");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 30);
        assert!(config.proactive_expiry);

        env::set_var("PROACTIVE_EXPIRY", "false");
        env::set_var("CLEANUP_INTERVAL", "0");
        env::set_var("SERVER_PORT", "not-a-port");

        let config = Config::from_env();
        assert!(!config.proactive_expiry);
        assert_eq!(config.cleanup_interval, 30);
        assert_eq!(config.server_port, 3000);

        env::remove_var("PROACTIVE_EXPIRY");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("SERVER_PORT");
    }
}
