use std::env;
use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_DB_NAME: &str = "mewayz";
const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8001";
const DEFAULT_JWT_PARTY: &str = "mewayz";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct StripeSettings {
    pub secret_key: String,
    pub webhook_secret: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_url: String,
    pub db_name: String,
    pub frontend_origin: String,
    pub bind_addr: SocketAddr,
    pub stripe: StripeSettings,
    pub jwt_issuer: String,
    pub jwt_audience: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // Load .env file

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let mongo_url = required("MONGO_URL")?;
        let secret_key = required("STRIPE_SECRET_KEY")?;
        let webhook_secret = required("STRIPE_WEBHOOK_SECRET")?;

        let bind_raw = optional("BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        Ok(Config {
            mongo_url,
            db_name: optional("DB_NAME", DEFAULT_DB_NAME),
            frontend_origin: optional("FRONTEND_ORIGIN", DEFAULT_FRONTEND_ORIGIN),
            bind_addr,
            stripe: StripeSettings {
                secret_key,
                webhook_secret,
            },
            jwt_issuer: optional("JWT_ISSUER", DEFAULT_JWT_PARTY),
            jwt_audience: optional("JWT_AUDIENCE", DEFAULT_JWT_PARTY),
        })
    }
}
