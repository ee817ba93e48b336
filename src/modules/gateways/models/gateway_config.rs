use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use crate::core::{AppError, Result};

/// Redirect-style payment providers the admin app can hand a customer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayProvider {
    Vnpay,
    Momo,
    Zalopay,
}

impl GatewayProvider {
    pub const ALL: [GatewayProvider; 3] = [
        GatewayProvider::Vnpay,
        GatewayProvider::Momo,
        GatewayProvider::Zalopay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayProvider::Vnpay => "vnpay",
            GatewayProvider::Momo => "momo",
            GatewayProvider::Zalopay => "zalopay",
        }
    }

    /// Prefix of this provider's environment variables
    pub fn env_prefix(&self) -> &'static str {
        match self {
            GatewayProvider::Vnpay => "VNPAY",
            GatewayProvider::Momo => "MOMO",
            GatewayProvider::Zalopay => "ZALOPAY",
        }
    }

    pub fn default_base_url(&self, environment: GatewayEnvironment) -> &'static str {
        match (self, environment) {
            (GatewayProvider::Vnpay, GatewayEnvironment::Sandbox) => {
                "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html"
            }
            (GatewayProvider::Vnpay, GatewayEnvironment::Production) => {
                "https://pay.vnpay.vn/vpcpay.html"
            }
            (GatewayProvider::Momo, GatewayEnvironment::Sandbox) => {
                "https://test-payment.momo.vn/v2/gateway/api/create"
            }
            (GatewayProvider::Momo, GatewayEnvironment::Production) => {
                "https://payment.momo.vn/v2/gateway/api/create"
            }
            (GatewayProvider::Zalopay, GatewayEnvironment::Sandbox) => {
                "https://sb-openapi.zalopay.vn/v2/create"
            }
            (GatewayProvider::Zalopay, GatewayEnvironment::Production) => {
                "https://openapi.zalopay.vn/v2/create"
            }
        }
    }
}

impl fmt::Display for GatewayProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GatewayProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vnpay" => Ok(GatewayProvider::Vnpay),
            "momo" => Ok(GatewayProvider::Momo),
            "zalopay" => Ok(GatewayProvider::Zalopay),
            _ => Err(AppError::gateway_not_configured(format!(
                "unknown provider '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    Sandbox,
    Production,
}

impl fmt::Display for GatewayEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayEnvironment::Sandbox => write!(f, "sandbox"),
            GatewayEnvironment::Production => write!(f, "production"),
        }
    }
}

/// Per-provider gateway settings, loaded once at startup
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    pub provider: GatewayProvider,
    pub enabled: bool,
    pub environment: GatewayEnvironment,
    pub hash_secret: String,
    pub merchant_code: String,
    pub return_url: String,
    pub base_url: String,
    /// How long a redirect stays valid on the provider side
    pub expire_minutes: i64,
}

impl ProviderConfig {
    /// Load `{PREFIX}_ENABLED`, `{PREFIX}_SANDBOX`, `{PREFIX}_HASH_SECRET`,
    /// `{PREFIX}_TMN_CODE`, `{PREFIX}_RETURN_URL`, `{PREFIX}_BASE_URL` and
    /// `{PREFIX}_EXPIRE_MINUTES`.
    ///
    /// A provider without variables loads as disabled rather than failing
    /// startup; it is rejected later at redirect time.
    pub fn from_env(provider: GatewayProvider) -> Result<Self> {
        let prefix = provider.env_prefix();
        let var = |name: &str| env::var(format!("{}_{}", prefix, name)).ok();

        let enabled = parse_bool(var("ENABLED").as_deref(), false, prefix, "ENABLED")?;
        let sandbox = parse_bool(var("SANDBOX").as_deref(), true, prefix, "SANDBOX")?;
        let environment = if sandbox {
            GatewayEnvironment::Sandbox
        } else {
            GatewayEnvironment::Production
        };

        let expire_minutes = match var("EXPIRE_MINUTES") {
            Some(raw) => raw.parse().map_err(|_| {
                AppError::Configuration(format!("Invalid {}_EXPIRE_MINUTES", prefix))
            })?,
            None => 15,
        };

        Ok(Self {
            provider,
            enabled,
            environment,
            hash_secret: var("HASH_SECRET").unwrap_or_default(),
            merchant_code: var("TMN_CODE").unwrap_or_default(),
            return_url: var("RETURN_URL").unwrap_or_default(),
            base_url: var("BASE_URL")
                .unwrap_or_else(|| provider.default_base_url(environment).to_string()),
            expire_minutes,
        })
    }

    /// Disabled placeholder used when a provider has no configuration
    pub fn disabled(provider: GatewayProvider) -> Self {
        Self {
            provider,
            enabled: false,
            environment: GatewayEnvironment::Sandbox,
            hash_secret: String::new(),
            merchant_code: String::new(),
            return_url: String::new(),
            base_url: provider
                .default_base_url(GatewayEnvironment::Sandbox)
                .to_string(),
            expire_minutes: 15,
        }
    }

    pub fn is_sandbox(&self) -> bool {
        self.environment == GatewayEnvironment::Sandbox
    }

    /// Enabled and carrying everything needed to sign a redirect
    pub fn is_usable(&self) -> bool {
        self.enabled
            && !self.hash_secret.trim().is_empty()
            && !self.merchant_code.trim().is_empty()
            && !self.return_url.trim().is_empty()
    }

    pub fn ensure_usable(&self) -> Result<()> {
        if !self.enabled {
            return Err(AppError::gateway_not_configured(format!(
                "{} is disabled",
                self.provider
            )));
        }
        if self.hash_secret.trim().is_empty() {
            return Err(AppError::gateway_not_configured(format!(
                "{} has no hash secret",
                self.provider
            )));
        }
        if self.merchant_code.trim().is_empty() || self.return_url.trim().is_empty() {
            return Err(AppError::gateway_not_configured(format!(
                "{} is missing merchant code or return URL",
                self.provider
            )));
        }
        Ok(())
    }
}

// Hand-written so the hash secret never ends up in logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("enabled", &self.enabled)
            .field("environment", &self.environment)
            .field("hash_secret", &"<redacted>")
            .field("merchant_code", &self.merchant_code)
            .field("return_url", &self.return_url)
            .field("base_url", &self.base_url)
            .field("expire_minutes", &self.expire_minutes)
            .finish()
    }
}

fn parse_bool(raw: Option<&str>, default: bool, prefix: &str, name: &str) -> Result<bool> {
    match raw.map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::Configuration(format!(
                "Invalid {}_{}: expected a boolean",
                prefix, name
            ))),
        },
    }
}
