//! Process configuration, read once from the environment (after `.env`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Credentials for the admin created on first start.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub jwt_secret: Vec<u8>,
    pub token_ttl_hours: i64,
    pub auto_approve_reviews: bool,
    pub admin_bootstrap: Option<AdminBootstrap>,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET")
            .ok_or(ConfigError::Missing("JWT_SECRET"))?
            .into_bytes();

        let token_ttl_hours = match get("TOKEN_TTL_HOURS") {
            Some(v) => v
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| (1..=MAX_TOKEN_TTL_HOURS).contains(h))
                .ok_or(ConfigError::Invalid {
                    key: "TOKEN_TTL_HOURS",
                    value: v,
                })?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };

        let auto_approve_reviews = match get("AUTO_APPROVE_REVIEWS") {
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "AUTO_APPROVE_REVIEWS",
                        value: v,
                    });
                }
            },
            None => true,
        };

        let admin_bootstrap = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            _ => None,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_url: get("DATABASE_URL"),
            jwt_secret,
            token_ttl_hours,
            auto_approve_reviews,
            admin_bootstrap,
        })
    }

    /// In-memory config for tests and tools.
    pub fn with_secret(secret: &[u8]) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_url: None,
            jwt_secret: secret.to_vec(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            auto_approve_reviews: true,
            admin_bootstrap: None,
        }
    }
}
