//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;

/// Proxy and cache manager configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin the proxy forwards requests to
    pub upstream_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Version suffix of the cache store names
    pub cache_version: String,
    /// Periodic sweep interval in seconds
    pub sweep_interval: u64,
    /// Whether the host supports periodic background sweeps
    pub periodic_sweep: bool,
    /// Upstream fetch timeout in seconds
    pub fetch_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `UPSTREAM_URL` - Origin server (default: http://127.0.0.1:3000)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CACHE_VERSION` - Cache store version (default: v1)
    /// - `SWEEP_INTERVAL` - Periodic sweep frequency in seconds (default: 86400)
    /// - `PERIODIC_SWEEP` - Enable periodic sweep registration (default: true)
    /// - `FETCH_TIMEOUT` - Upstream timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            cache_version: env::var("CACHE_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_version),
            sweep_interval: env::var("SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
            periodic_sweep: env::var("PERIODIC_SWEEP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.periodic_sweep),
            fetch_timeout: env::var("FETCH_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout),
        }
    }

    /// Name of the static cache store for this version.
    pub fn static_cache_name(&self) -> String {
        format!("static-{}", self.cache_version)
    }

    /// Name of the runtime cache store for this version.
    pub fn runtime_cache_name(&self) -> String {
        format!("runtime-{}", self.cache_version)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: "http://127.0.0.1:3000".to_string(),
            server_port: 8080,
            cache_version: "v1".to_string(),
            sweep_interval: 86_400,
            periodic_sweep: true,
            fetch_timeout: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.upstream_url, "http://127.0.0.1:3000");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.sweep_interval, 86_400);
        assert!(config.periodic_sweep);
    }

    #[test]
    fn test_cache_names_carry_version() {
        let config = Config {
            cache_version: "v7".to_string(),
            ..Config::default()
        };
        assert_eq!(config.static_cache_name(), "static-v7");
        assert_eq!(config.runtime_cache_name(), "runtime-v7");
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("UPSTREAM_URL");
        env::remove_var("SERVER_PORT");
        env::remove_var("CACHE_VERSION");
        env::remove_var("SWEEP_INTERVAL");
        env::remove_var("PERIODIC_SWEEP");
        env::remove_var("FETCH_TIMEOUT");

        let config = Config::from_env();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cache_version, "v1");
        assert_eq!(config.fetch_timeout, 30);
    }
}
