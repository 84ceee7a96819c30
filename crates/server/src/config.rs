//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (or `ECOSHOP_DATABASE_URL`)
//!
//! ## Optional
//! - `ECOSHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `ECOSHOP_PORT` - Listen port (default: 4000)
//! - `ECOSHOP_CORS_ORIGIN` - Allowed browser origin (default: allow any)
//! - `ECOSHOP_SESSION_TTL_DAYS` - Bearer session lifetime (default: 30)
//! - `PAYMENT_SIM_DELAY_MS` - Simulated gateway delay (default: 3000)
//! - `PAYMENT_SIM_OUTCOME` - `success`, `failure`, or a rate like `0.9`
//!   (default: success)
//!
//! ## Optional SMTP block (email disabled when `SMTP_HOST` is unset)
//! - `SMTP_HOST` / `SMTP_PORT` (587) / `SMTP_USERNAME` / `SMTP_PASSWORD`
//! - `SMTP_FROM` - From address for transactional mail

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::services::payments::{PaymentSimConfig, SimulatedOutcome};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Browser origin allowed by CORS, if restricted
    pub cors_origin: Option<String>,
    /// Bearer session lifetime in days
    pub session_ttl_days: i64,
    /// SMTP settings; `None` disables email delivery
    pub smtp: Option<SmtpConfig>,
    /// Payment simulator behavior
    pub payment: PaymentSimConfig,
}

/// SMTP configuration for transactional email.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ECOSHOP_DATABASE_URL")?;
        let host = get_env_or_default("ECOSHOP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ECOSHOP_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("ECOSHOP_PORT", "4000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ECOSHOP_PORT".to_owned(), e.to_string()))?;
        let cors_origin = get_optional_env("ECOSHOP_CORS_ORIGIN");
        let session_ttl_days = get_env_or_default("ECOSHOP_SESSION_TTL_DAYS", "30")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ECOSHOP_SESSION_TTL_DAYS".to_owned(), e.to_string())
            })?;

        let smtp = SmtpConfig::from_env()?;
        let payment = payment_sim_from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            cors_origin,
            session_ttl_days,
            smtp,
            payment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SmtpConfig {
    /// Load the SMTP block; absent `SMTP_HOST` disables email entirely.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        let port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_owned(), e.to_string()))?;

        Ok(Some(Self {
            host,
            port,
            username: get_required_env("SMTP_USERNAME")?,
            password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from_address: get_required_env("SMTP_FROM")?,
        }))
    }
}

/// Load the payment simulator settings.
fn payment_sim_from_env() -> Result<PaymentSimConfig, ConfigError> {
    let delay_ms = get_env_or_default("PAYMENT_SIM_DELAY_MS", "3000")
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("PAYMENT_SIM_DELAY_MS".to_owned(), e.to_string()))?;

    let outcome_raw = get_env_or_default("PAYMENT_SIM_OUTCOME", "success");
    let outcome = parse_outcome(&outcome_raw).ok_or_else(|| {
        ConfigError::InvalidEnvVar(
            "PAYMENT_SIM_OUTCOME".to_owned(),
            format!("expected success, failure, or a rate in [0,1], got {outcome_raw}"),
        )
    })?;

    Ok(PaymentSimConfig {
        delay: Duration::from_millis(delay_ms),
        outcome,
    })
}

/// Parse an outcome setting: `success`, `failure`, or a probability.
fn parse_outcome(value: &str) -> Option<SimulatedOutcome> {
    match value {
        "success" => Some(SimulatedOutcome::AlwaysSucceed),
        "failure" => Some(SimulatedOutcome::AlwaysFail),
        other => {
            let rate = other.parse::<f64>().ok()?;
            (0.0..=1.0).contains(&rate).then_some(SimulatedOutcome::SuccessRate(rate))
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outcome_keywords() {
        assert_eq!(parse_outcome("success"), Some(SimulatedOutcome::AlwaysSucceed));
        assert_eq!(parse_outcome("failure"), Some(SimulatedOutcome::AlwaysFail));
    }

    #[test]
    fn test_parse_outcome_rate() {
        assert_eq!(parse_outcome("0.9"), Some(SimulatedOutcome::SuccessRate(0.9)));
        assert_eq!(parse_outcome("0"), Some(SimulatedOutcome::SuccessRate(0.0)));
        assert_eq!(parse_outcome("1"), Some(SimulatedOutcome::SuccessRate(1.0)));
    }

    #[test]
    fn test_parse_outcome_rejects_garbage() {
        assert_eq!(parse_outcome("1.5"), None);
        assert_eq!(parse_outcome("-0.1"), None);
        assert_eq!(parse_outcome("always"), None);
    }

    #[test]
    fn test_socket_addr() {
        let config = Config {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().expect("valid ip"),
            port: 4000,
            cors_origin: None,
            session_ttl_days: 30,
            smtp: None,
            payment: PaymentSimConfig::default(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 4000);
    }

    #[test]
    fn test_smtp_config_debug_redacts_password() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_owned(),
            port: 587,
            username: "mailer".to_owned(),
            password: SecretString::from("super_secret_password"),
            from_address: "EcoShop <orders@ecoshop.example>".to_owned(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("smtp.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password"));
    }
}
