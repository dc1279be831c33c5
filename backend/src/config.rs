//! Configuration management for the Pro Connect backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PRC_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Outbound OTP mail configuration
    pub mailer: MailerConfig,

    /// Document text extraction service configuration
    pub extractor: ExtractorConfig,

    /// Uploaded document storage configuration
    pub uploads: UploadsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Token expiration in seconds
    pub token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailerConfig {
    /// Mail relay API endpoint
    pub endpoint: String,

    /// Mail relay API key
    pub api_key: String,

    /// Sender address for OTP mail
    pub sender: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    /// Text extraction service endpoint
    pub endpoint: String,

    /// Text extraction service API key
    pub api_key: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    /// Base directory for uploaded documents
    pub base_dir: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PRC_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.token_expiry", 3600)?
            .set_default("extractor.timeout_secs", 30)?
            .set_default("uploads.base_dir", "uploads")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PRC_ prefix)
            .add_source(
                Environment::with_prefix("PRC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
