use std::time::Duration;

use crate::error::AppError;

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub token_expiry_hours: i64,
    /// Base64-encoded 32-byte Ed25519 seed. A fresh key is generated when unset.
    pub token_signing_key: Option<String>,
    pub request_timeout_secs: u64,
    pub push_timeout_ms: u64,
    pub outbound_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            database_url: "sqlite://dm_relay.db?mode=rwc".to_string(),
            db_max_connections: 20,
            db_min_connections: 1,
            token_expiry_hours: 24,
            token_signing_key: None,
            request_timeout_secs: 30,
            push_timeout_ms: 2000,
            outbound_queue_capacity: 64,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Config::default();

        Ok(Config {
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.db_min_connections)?,
            token_expiry_hours: parse_var("TOKEN_EXPIRY_HOURS", defaults.token_expiry_hours)?,
            token_signing_key: std::env::var("TOKEN_SIGNING_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            push_timeout_ms: parse_var("PUSH_TIMEOUT_MS", defaults.push_timeout_ms)?,
            outbound_queue_capacity: parse_var(
                "OUTBOUND_QUEUE_CAPACITY",
                defaults.outbound_queue_capacity,
            )?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
