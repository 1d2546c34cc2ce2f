//! Configuration system
//! All settings load from environment variables (prefix ELIB_); secrets
//! are wrapped in Secret so they never appear in logs. The constructed
//! AppConfig is passed down into services explicitly; nothing reads
//! process state after startup.

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. "0.0.0.0:8080"
    pub addr: String,
    /// Graceful shutdown timeout in seconds
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection URI
    pub uri: Secret<String>,
    /// Database name
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Access-token signing secret (HS256)
    pub access_token_secret: Secret<String>,
    /// Refresh-token signing secret (HS256), distinct from the access secret
    pub refresh_token_secret: Secret<String>,
    /// Access token lifetime in seconds
    pub access_token_exp_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_exp_secs: u64,
    /// Minimum password length accepted at registration
    pub password_min_length: usize,
    /// Set the Secure attribute on auth cookies
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Media host account (cloud) name
    pub cloud_name: String,
    /// API key sent with signed requests
    pub api_key: String,
    /// API secret used to sign upload/destroy requests
    pub api_secret: Secret<String>,
    /// Base URL of the media host API
    pub base_url: String,
    /// Folder for cover images
    pub cover_folder: String,
    /// Folder for book documents
    pub file_folder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    /// Local staging directory for multipart uploads
    pub dir: String,
    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Allowed origin for browser clients (credentials are enabled)
    pub allow_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub media: MediaConfig,
    pub uploads: UploadsConfig,
    pub cors: CorsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        settings = settings
            .set_default("server.addr", "0.0.0.0:8080")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("database.uri", "mongodb://localhost:27017")?
            .set_default("database.name", "elib")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default(
                "security.access_token_secret",
                "change-this-access-secret-in-production-32ch",
            )?
            .set_default(
                "security.refresh_token_secret",
                "change-this-refresh-secret-in-production-32c",
            )?
            .set_default("security.access_token_exp_secs", 900)?
            .set_default("security.refresh_token_exp_secs", 2_592_000)?
            .set_default("security.password_min_length", 8)?
            .set_default("security.cookie_secure", true)?
            .set_default("media.cloud_name", "")?
            .set_default("media.api_key", "")?
            .set_default("media.api_secret", "")?
            .set_default("media.base_url", "https://api.cloudinary.com/v1_1")?
            .set_default("media.cover_folder", "book-covers")?
            .set_default("media.file_folder", "book-pdfs")?
            .set_default("uploads.dir", "/var/lib/elib-service/uploads")?
            .set_default("uploads.max_body_bytes", 10_000_000)?
            .set_default("cors.allow_origin", None::<String>)?;

        settings = settings.add_source(
            Environment::with_prefix("ELIB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration invariants
    fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.database.name.is_empty() {
            return Err(ConfigError::Message(
                "database.name must not be empty".to_string(),
            ));
        }

        // HS256 signing keys (at least 32 chars each, and distinct)
        if self.security.access_token_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "access_token_secret must be at least 32 characters long".to_string(),
            ));
        }
        if self.security.refresh_token_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "refresh_token_secret must be at least 32 characters long".to_string(),
            ));
        }
        if self.security.access_token_secret.expose_secret()
            == self.security.refresh_token_secret.expose_secret()
        {
            return Err(ConfigError::Message(
                "access_token_secret and refresh_token_secret must differ".to_string(),
            ));
        }

        if self.security.access_token_exp_secs < 60 || self.security.access_token_exp_secs > 86400 {
            return Err(ConfigError::Message(
                "access_token_exp_secs must be between 60 and 86400 (1 minute to 24 hours)"
                    .to_string(),
            ));
        }

        if self.security.refresh_token_exp_secs < 3600
            || self.security.refresh_token_exp_secs > 7_776_000
        {
            return Err(ConfigError::Message(
                "refresh_token_exp_secs must be between 3600 and 7776000 (1 hour to 90 days)"
                    .to_string(),
            ));
        }

        if self.security.password_min_length < 6 || self.security.password_min_length > 128 {
            return Err(ConfigError::Message(
                "password_min_length must be between 6 and 128".to_string(),
            ));
        }

        if self.uploads.max_body_bytes < 1024 {
            return Err(ConfigError::Message(
                "uploads.max_body_bytes must be at least 1024".to_string(),
            ));
        }

        Ok(())
    }
}
