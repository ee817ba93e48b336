use std::env;
use std::str::FromStr;

use serde::Deserialize;

use crate::core::{AppError, Result};
use crate::modules::gateways::models::{GatewayProvider, ProviderConfig};

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Everything the process reads at startup
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub gateways: GatewaysConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    /// `text` or `json`
    pub log_format: String,
    /// How often the stale-payment sweeper runs
    pub sweep_interval_secs: u64,
    /// Age after which an unanswered gateway payment is reaped
    pub pending_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            env: env_parse("APP_ENV", "development".to_string())?,
            log_format: env_parse("LOG_FORMAT", "text".to_string())?,
            sweep_interval_secs: env_parse("PENDING_SWEEP_INTERVAL_SECS", 300)?,
            pending_ttl_minutes: env_parse("PENDING_PAYMENT_TTL_MINUTES", 60)?,
        })
    }
}

/// One entry per supported provider; immutable after startup
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaysConfig {
    pub vnpay: ProviderConfig,
    pub momo: ProviderConfig,
    pub zalopay: ProviderConfig,
}

impl GatewaysConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            vnpay: ProviderConfig::from_env(GatewayProvider::Vnpay)?,
            momo: ProviderConfig::from_env(GatewayProvider::Momo)?,
            zalopay: ProviderConfig::from_env(GatewayProvider::Zalopay)?,
        })
    }

    pub fn get(&self, provider: GatewayProvider) -> &ProviderConfig {
        match provider {
            GatewayProvider::Vnpay => &self.vnpay,
            GatewayProvider::Momo => &self.momo,
            GatewayProvider::Zalopay => &self.zalopay,
        }
    }

    pub fn all(&self) -> [&ProviderConfig; 3] {
        [&self.vnpay, &self.momo, &self.zalopay]
    }
}

impl Config {
    /// Load from the environment, reading `.env` first when present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            gateways: GatewaysConfig::from_env()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;

        if self.app.sweep_interval_secs == 0 {
            return Err(AppError::Configuration(
                "Sweep interval must be greater than 0".to_string(),
            ));
        }

        if self.app.pending_ttl_minutes <= 0 {
            return Err(AppError::Configuration(
                "Pending payment TTL must be greater than 0".to_string(),
            ));
        }

        for provider in self.gateways.all() {
            if provider.enabled && provider.expire_minutes <= 0 {
                return Err(AppError::Configuration(format!(
                    "{} expire minutes must be greater than 0",
                    provider.provider
                )));
            }
            // Startup continues; requests for this provider are rejected
            if provider.enabled && !provider.is_usable() {
                tracing::warn!(
                    provider = %provider.provider,
                    "Gateway enabled without secret, merchant code or return URL"
                );
            }
        }

        let vnpay = &self.gateways.vnpay;
        if vnpay.enabled && self.app.pending_ttl_minutes < vnpay.expire_minutes {
            return Err(AppError::Configuration(
                "Pending payment TTL must not be shorter than the VNPay redirect expiry".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse `key`, falling back to `default` when unset
pub(crate) fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        _ => Ok(default),
    }
}

pub(crate) fn env_required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| AppError::Configuration(format!("{} not set", key)))
}

pub(crate) fn env_flag(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::Configuration(format!("Invalid {}", key))),
        },
        Err(_) => Ok(default),
    }
}
