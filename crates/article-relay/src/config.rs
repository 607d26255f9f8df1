use std::env;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;
use url::Url;

use crate::auth::SharedSecret;

/// Environment variable holding the Discord webhook URL.
pub const WEBHOOK_URL_ENV: &str = "DISCORD_WEBHOOK_URL";

/// Environment variable holding the shared secret.
pub const AUTH_TOKEN_ENV: &str = "AUTH_TOKEN";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let config: Self = serde_saphyr::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check timeouts against each other.
    ///
    /// A webhook call must give up before the request it serves does, so a
    /// stalled Discord surfaces as a delivery failure rather than a timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let request = self.server.request_timeout_seconds;
        let delivery = self.delivery.timeout_seconds;

        if request == 0 {
            return Err(ConfigError::ZeroTimeout("server.request_timeout_seconds"));
        }
        if delivery == 0 {
            return Err(ConfigError::ZeroTimeout("delivery.timeout_seconds"));
        }
        if delivery >= request {
            return Err(ConfigError::DeliveryOutlastsRequest { delivery, request });
        }
        Ok(())
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

// ============================================================================
// DeliveryConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DeliveryConfig {
    /// Upper bound for one webhook call, connect included.
    #[serde(default = "default_delivery_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_delivery_timeout(),
        }
    }
}

fn default_delivery_timeout() -> u64 {
    10
}

// ============================================================================
// Secrets
// ============================================================================

/// Values that must never live in a config file.
#[derive(Clone)]
pub struct Secrets {
    pub webhook_url: String,
    pub token: SharedSecret,
}

// Discord webhook URLs embed their own token.
impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("webhook_url", &"<redacted>")
            .field("token", &self.token)
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve secrets through an arbitrary lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let webhook_url = lookup(WEBHOOK_URL_ENV)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv(WEBHOOK_URL_ENV))?;
        Url::parse(&webhook_url).map_err(ConfigError::InvalidWebhookUrl)?;

        let token = lookup(AUTH_TOKEN_ENV)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv(AUTH_TOKEN_ENV))?;

        Ok(Self {
            webhook_url,
            token: SharedSecret::new(token),
        })
    }
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("DISCORD_WEBHOOK_URL is not a valid URL: {0}")]
    InvalidWebhookUrl(#[source] url::ParseError),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(
        "delivery timeout ({delivery}s) must be shorter than the request timeout ({request}s)"
    )]
    DeliveryOutlastsRequest { delivery: u64, request: u64 },
}

// ============================================================================
// Tests
// ============================================================================
