use std::env;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::SecretString;
use thiserror::Error;

use crate::constants::DEFAULT_STORE_TIMEOUT_SECS;

/// Configuration errors raised at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Origin allowed by the CORS layer
#[derive(Debug, Clone, PartialEq)]
pub enum AllowedOrigin {
    /// `*`
    Any,
    Exact(HeaderValue),
}

impl AllowedOrigin {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();
        if value == "*" {
            return Ok(AllowedOrigin::Any);
        }

        HeaderValue::from_str(value)
            .ok()
            .filter(|_| !value.is_empty())
            .map(AllowedOrigin::Exact)
            .ok_or_else(|| ConfigError::Invalid {
                key: "ALLOWED_ORIGIN",
                value: value.to_string(),
            })
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Which backend the store talks to
#[derive(Debug)]
pub enum StoreBackend {
    /// Managed backend REST API
    Rest {
        url: String,
        api_key: SecretString,
        timeout: Duration,
    },
    /// Direct Postgres connection
    Postgres {
        database_url: SecretString,
        max_connections: u32,
    },
    /// In-process tables (development only)
    Memory,
}

/// Application configuration loaded from environment variables
#[derive(Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub allowed_origin: AllowedOrigin,
    pub log_requests: bool,
    pub log_format: LogFormat,
    pub store: StoreBackend,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parse_var("SERVER_PORT", 8080)?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let allowed_origin =
            AllowedOrigin::parse(&env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string()))?;

        let log_requests = parse_var("LOG_REQUESTS", true)?;

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Err(_) | Ok("pretty") => LogFormat::Pretty,
            Ok("json") => LogFormat::Json,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let store = Self::store_from_env()?;

        Ok(Config {
            server_host,
            server_port,
            environment,
            allowed_origin,
            log_requests,
            log_format,
            store,
        })
    }

    fn store_from_env() -> Result<StoreBackend, ConfigError> {
        let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| "rest".to_string());

        match backend.as_str() {
            "rest" => {
                let url = env::var("SUPABASE_URL").map_err(|_| ConfigError::Missing("SUPABASE_URL"))?;
                // Server-side deployments use the service key; the anon key is the fallback
                let api_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
                    .or_else(|_| env::var("SUPABASE_ANON_KEY"))
                    .map_err(|_| ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?;
                let timeout_secs = parse_var("STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT_SECS)?;

                Ok(StoreBackend::Rest {
                    url,
                    api_key: SecretString::from(api_key),
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            "postgres" => {
                let database_url =
                    env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
                let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 10)?;

                Ok(StoreBackend::Postgres {
                    database_url: SecretString::from(database_url),
                    max_connections,
                })
            }
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "STORE_BACKEND",
                value: other.to_string(),
            }),
        }
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Read and parse an optional variable, using `default` when unset
fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origin_wildcard() {
        assert_eq!(AllowedOrigin::parse("*").unwrap(), AllowedOrigin::Any);
        assert_eq!(AllowedOrigin::parse(" * ").unwrap(), AllowedOrigin::Any);
    }

    #[test]
    fn test_allowed_origin_exact() {
        let origin = AllowedOrigin::parse("https://app.example.com").unwrap();
        assert_eq!(
            origin,
            AllowedOrigin::Exact(HeaderValue::from_static("https://app.example.com"))
        );
    }

    #[test]
    fn test_allowed_origin_invalid() {
        assert!(matches!(
            AllowedOrigin::parse(""),
            Err(ConfigError::Invalid { key: "ALLOWED_ORIGIN", .. })
        ));
        assert!(AllowedOrigin::parse("https://bad\norigin").is_err());
    }

    #[test]
    fn test_server_address() {
        let config = Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "test".to_string(),
            allowed_origin: AllowedOrigin::Any,
            log_requests: false,
            log_format: LogFormat::Pretty,
            store: StoreBackend::Memory,
        };
        assert_eq!(config.server_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::Missing("SUPABASE_URL").to_string(),
            "SUPABASE_URL must be set"
        );
        assert_eq!(
            ConfigError::Invalid {
                key: "SERVER_PORT",
                value: "http".to_string()
            }
            .to_string(),
            "Invalid SERVER_PORT: http"
        );
    }
}
