use anyhow::{Context, Result};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::errors::ConfigError;
use crate::executor::RetryPolicy;

/// Application configuration module
/// This module handles loading, validating and saving configuration settings.
/// The API key is never part of the file; it comes from the environment.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    // @field: Model identifier, overridden by OPENAI_MODEL
    #[serde(default = "default_model")]
    pub model: String,

    // @field: API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retry settings for model calls
    #[serde(default)]
    pub retry: RetryConfig,

    // @field: Directory for result documents
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    // @field: Characters sent to the language probe
    #[serde(default = "default_detect_sample_chars")]
    pub detect_sample_chars: usize,

    // @field: Ask the endpoint for a JSON object reply
    #[serde(default = "default_true")]
    pub structured_output: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Retry settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    // @field: Attempts per call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    // @field: Base backoff in seconds, multiplied by the attempt index
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl RetryConfig {
    // @returns: Executor policy for these settings
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log crate filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    crate::executor::MAX_RETRIES
}

fn default_retry_delay_secs() -> u64 {
    crate::executor::RETRY_DELAY_SECONDS
}

fn default_output_dir() -> String {
    crate::output_manager::DEFAULT_OUTPUT_DIR.to_string()
}

fn default_detect_sample_chars() -> usize {
    crate::operations::DETECT_SAMPLE_CHARS
}

fn default_true() -> bool {
    true
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
            output_dir: default_output_dir(),
            detect_sample_chars: default_detect_sample_chars(),
            structured_output: true,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::Invalid(format!("endpoint '{}': {}", self.endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "endpoint '{}' must use http or https",
                self.endpoint
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }

        if self.retry.max_retries == 0 {
            return Err(ConfigError::Invalid("retry.max_retries must be at least 1".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }

        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("output_dir must not be empty".to_string()));
        }

        if self.detect_sample_chars == 0 {
            return Err(ConfigError::Invalid("detect_sample_chars must be positive".to_string()));
        }

        Ok(())
    }

    // @returns: Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load the configuration file, writing a default one when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).context(format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .context(format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }
}

/// Secret plus model identifier, built once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    api_key: String,
    model: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl Credential {
    // @creates: Credential from explicit values
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build from CLI/environment values, falling back to the config model
    pub fn resolve(api_key: Option<&str>, model: Option<&str>, config: &Config) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        let model = model
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(config.model.as_str());

        Ok(Self::new(api_key, model))
    }

    // @returns: The secret
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    // @returns: Model identifier
    pub fn model(&self) -> &str {
        &self.model
    }
}
