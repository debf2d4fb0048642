//! Server configuration from command line arguments and environment variables

use clap::Parser;
use std::time::Duration;

use crate::pagination::{PaginationPolicy, DEFAULT_MAX_PER_PAGE};

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8000;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Catalog gateway configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "gateway-server", version, about = "Read-only PostgreSQL catalog gateway")]
pub struct Config {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "GATEWAY_HOST", default_value = DEFAULT_HTTP_HOST)]
    pub http_host: String,

    /// Port to bind the HTTP listener to
    #[arg(long, env = "GATEWAY_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "GATEWAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "GATEWAY_JSON_LOGS")]
    pub json_logs: bool,

    /// Upper bound for a single catalog query, in seconds
    #[arg(long, env = "GATEWAY_QUERY_TIMEOUT", default_value_t = DEFAULT_QUERY_TIMEOUT_SECS)]
    pub query_timeout_secs: u64,

    /// Upper bound for opening a database session, in seconds
    #[arg(long, env = "GATEWAY_CONNECT_TIMEOUT", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,

    /// Largest accepted per_page; larger requests are clamped to it
    #[arg(long, env = "GATEWAY_MAX_PER_PAGE", default_value_t = DEFAULT_MAX_PER_PAGE,
          value_parser = clap::value_parser!(i64).range(1..))]
    pub max_per_page: i64,
}

impl Config {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn pagination(&self) -> PaginationPolicy {
        PaginationPolicy::new(self.max_per_page)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["gateway-server"]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert_eq!(config.query_timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.pagination().max_per_page(), DEFAULT_MAX_PER_PAGE);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "gateway-server",
            "--http-port",
            "9000",
            "--max-per-page",
            "50",
            "--query-timeout-secs",
            "5",
            "--json-logs",
        ])
        .unwrap();

        assert_eq!(config.http_port, 9000);
        assert_eq!(config.pagination().max_per_page(), 50);
        assert_eq!(config.query_timeout(), Duration::from_secs(5));
        assert!(config.json_logs);
    }

    #[test]
    fn test_rejects_zero_max_per_page() {
        assert!(Config::try_parse_from(["gateway-server", "--max-per-page", "0"]).is_err());
    }
}
