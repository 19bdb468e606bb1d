//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. The generation API key is wrapped in secrecy::SecretString
//! to prevent log leaks.

pub mod secrets;

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL: &str = "deepseek-chat";

#[derive(Debug)]
pub struct Config {
    pub deepseek_api_key: SecretString,
    pub bind_addr: String,
    pub port: u16,
    pub storage: StorageConfig,
    pub static_dir: Option<PathBuf>,
    pub model: String,
    pub generation_timeout: Duration,
    pub request_delay: Duration,
    pub flush_every: usize,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let flush_every: usize = parsed_var("FLUSH_EVERY", 50)?;
        if flush_every == 0 {
            return Err(Error::Config("FLUSH_EVERY must be greater than zero".to_string()));
        }

        Ok(Self {
            deepseek_api_key: SecretString::from(required_var("DEEPSEEK_API_KEY")?),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed_var("PORT", DEFAULT_PORT)?,
            storage: StorageConfig::from_env()?,
            static_dir: std::env::var("STATIC_DIR").ok().map(PathBuf::from),
            model: std::env::var("GENERATION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            generation_timeout: Duration::from_secs(parsed_var("GENERATION_TIMEOUT_SECS", 60)?),
            request_delay: Duration::from_millis(parsed_var("REQUEST_DELAY_MS", 1000)?),
            flush_every,
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Where and how the item store keeps its files.
///
/// Split out so store-only commands work without the generation key.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub chunk_size: usize,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        let chunk_size: usize = parsed_var("CHUNK_SIZE", crate::storage::DEFAULT_CHUNK_SIZE)?;
        if chunk_size == 0 {
            return Err(Error::Config("CHUNK_SIZE must be greater than zero".to_string()));
        }
        Ok(Self {
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            chunk_size,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            Error::Config(format!("environment variable {name} has invalid value {raw:?}"))
        }),
        Err(_) => Ok(default),
    }
}
