use tally_core::budget::DEFAULT_CURRENCY;
use tally_core::validation::validate_currency;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// How long browsers may cache a CORS preflight, in seconds (default: `600`).
    pub cors_max_age_secs: u64,
    /// Largest accepted request body in bytes (default: `65536`).
    pub max_body_bytes: usize,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for the pool to drain after the server stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Currency given to budgets created on first access (default: `JPY`).
    pub default_currency: String,
    /// JWT verification settings.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `CORS_MAX_AGE_SECS`    | `600`                      |
    /// | `MAX_BODY_BYTES`       | `65536`                    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `DEFAULT_CURRENCY`     | `JPY`                      |
    ///
    /// # Panics
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let cors_max_age_secs: u64 = std::env::var("CORS_MAX_AGE_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("CORS_MAX_AGE_SECS must be a valid u64");

        let max_body_bytes: usize = std::env::var("MAX_BODY_BYTES")
            .unwrap_or_else(|_| "65536".into())
            .parse()
            .expect("MAX_BODY_BYTES must be a valid usize");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let default_currency =
            std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.into());
        if let Err(msg) = validate_currency(&default_currency) {
            panic!("DEFAULT_CURRENCY {msg}");
        }

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            cors_max_age_secs,
            max_body_bytes,
            request_timeout_secs,
            shutdown_timeout_secs,
            default_currency,
            jwt,
        }
    }
}
