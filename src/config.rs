//! Application configuration.
//! Environment variable loading, validation and the gateway's key material.

use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// OnePay gateway configuration.
///
/// `platform_public_key` authenticates inbound callbacks; when absent the
/// service runs in an explicitly logged unauthenticated mode.
/// `merchant_private_key` signs outbound requests and is unused by the
/// callback path itself. Both accept full PEM or bare base64 key material.
#[derive(Clone)]
pub struct GatewayConfig {
    pub merchant_no: String,
    pub platform_public_key: Option<String>,
    pub merchant_private_key: Option<String>,
    /// Payment-method slug prefix identifying this gateway's orders.
    pub method_prefix: String,
    /// Candidate window for the merchant-order-number fallback search.
    pub resolver_window: usize,
    /// Allowed paid-vs-expected difference, in minor currency units.
    pub amount_tolerance_minor: i64,
}

// Key material must never reach logs, so Debug is written by hand.
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("merchant_no", &self.merchant_no)
            .field(
                "platform_public_key",
                &self.platform_public_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "merchant_private_key",
                &self.merchant_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("method_prefix", &self.method_prefix)
            .field("resolver_window", &self.resolver_window)
            .field("amount_tolerance_minor", &self.amount_tolerance_minor)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone)]
pub enum LogFormat {
    Json,
    Plain,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            gateway: GatewayConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.gateway.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue(
                "SERVER_PORT cannot be 0".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SERVER_HOST cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(GatewayConfig {
            merchant_no: env::var("ONEPAY_MERCHANT_NO")
                .map_err(|_| ConfigError::MissingVariable("ONEPAY_MERCHANT_NO".to_string()))?,
            platform_public_key: env::var("ONEPAY_PLATFORM_PUBLIC_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            merchant_private_key: env::var("ONEPAY_MERCHANT_PRIVATE_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            method_prefix: env::var("ONEPAY_METHOD_PREFIX")
                .unwrap_or_else(|_| "onepay".to_string()),
            resolver_window: env::var("ONEPAY_RESOLVER_WINDOW")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ONEPAY_RESOLVER_WINDOW".to_string()))?,
            amount_tolerance_minor: env::var("ONEPAY_AMOUNT_TOLERANCE_MINOR")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("ONEPAY_AMOUNT_TOLERANCE_MINOR".to_string())
                })?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merchant_no.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "ONEPAY_MERCHANT_NO cannot be empty".to_string(),
            ));
        }
        if self.method_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "ONEPAY_METHOD_PREFIX cannot be empty".to_string(),
            ));
        }
        if self.resolver_window == 0 {
            return Err(ConfigError::InvalidValue(
                "ONEPAY_RESOLVER_WINDOW cannot be 0".to_string(),
            ));
        }
        if self.amount_tolerance_minor < 0 {
            return Err(ConfigError::InvalidValue(
                "ONEPAY_AMOUNT_TOLERANCE_MINOR cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),
}
