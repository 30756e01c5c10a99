use serde::Deserialize;
use shared::crypto::{KeyError, SignedKey};
use std::net::{AddrParseError, SocketAddr};

pub use persistence::db::DatabaseConfig;

/// Environment variable holding the hex-encoded identity key.
pub const SIGNED_KEY_ENV: &str = "SIGNED_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub play: PlayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// 16-byte BLAKE2b key, hex encoded. Usually supplied through `SIGNED_KEY`.
    #[serde(default)]
    pub signed_key: String,

    #[serde(default = "default_email_domain")]
    pub email_domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayConfig {
    /// Upper bound on retries when generating a unique uhash, code or password.
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            max_generation_attempts: default_max_generation_attempts(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_email_domain() -> String {
    domain::services::identity::DEFAULT_EMAIL_DOMAIN.to_string()
}
fn default_max_generation_attempts() -> u32 {
    persistence::repositories::matches::DEFAULT_MAX_GENERATION_ATTEMPTS
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PROGAME__ prefix
    /// 4. The bare SIGNED_KEY environment variable
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PROGAME").separator("__"));

        if let Ok(key) = std::env::var(SIGNED_KEY_ENV) {
            builder = builder.set_override("identity.signed_key", key)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds the config from embedded defaults, without touching config files
    /// or the process environment.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 2
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []

            [identity]
            signed_key = ""
            email_domain = "progame.io"

            [play]
            max_generation_attempts = 100
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Validation is left to the caller so tests can build partial configs.
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PROGAME__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.identity.signed_key.is_empty() {
            return Err(ConfigValidationError::MissingRequired(format!(
                "{} environment variable must be set",
                SIGNED_KEY_ENV
            )));
        }

        self.signed_key()
            .map_err(|e| ConfigValidationError::InvalidValue(format!("{}: {}", SIGNED_KEY_ENV, e)))?;

        Ok(())
    }

    /// Decoded identity key.
    pub fn signed_key(&self) -> Result<SignedKey, KeyError> {
        SignedKey::from_hex(&self.identity.signed_key)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
