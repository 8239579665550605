use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigurationError;
use crate::middleware::{RateLimiter, RetryExecutor, RetryPolicy};

pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const MAX_TOKENS: &str = "MAX_TOKENS";
pub const MAX_REQUESTS_PER_MINUTE: &str = "MAX_REQUESTS_PER_MINUTE";
pub const RETRY_MAX_ATTEMPTS: &str = "RETRY_MAX_ATTEMPTS";
pub const RETRY_DELAY_SECS: &str = "RETRY_DELAY_SECS";

/// Settings shared by the clients and the middleware.
///
/// Sources, lowest precedence first: built-in defaults, an optional TOML file,
/// a `.env` file, the process environment. API keys only ever come from the
/// environment.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(skip)]
    pub anthropic_api_key: Option<String>,

    #[serde(skip)]
    pub openai_api_key: Option<String>,

    /// Default Claude model
    pub anthropic_model: String,

    /// Default OpenAI model
    pub openai_model: String,

    /// Maximum tokens in a response
    pub max_tokens: u32,

    /// Rate limit applied by [`Config::rate_limiter`]
    pub max_requests_per_minute: usize,

    pub retry_max_attempts: u32,

    pub retry_delay_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            openai_api_key: None,
            anthropic_model: "claude-sonnet-4-20250514".to_string(),
            openai_model: "gpt-4o".to_string(),
            max_tokens: 1024,
            max_requests_per_minute: 50,
            retry_max_attempts: 3,
            retry_delay_secs: 1.0,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(key: Option<&String>) -> &'static str {
            if key.is_some() { "<set>" } else { "<unset>" }
        }

        f.debug_struct("Config")
            .field("anthropic_api_key", &redact(self.anthropic_api_key.as_ref()))
            .field("openai_api_key", &redact(self.openai_api_key.as_ref()))
            .field("anthropic_model", &self.anthropic_model)
            .field("openai_model", &self.openai_model)
            .field("max_tokens", &self.max_tokens)
            .field("max_requests_per_minute", &self.max_requests_per_minute)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .finish()
    }
}

impl Config {
    /// Load the configuration: `path` (if any), then `.env`, then the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        if let Err(e) = dotenv::dotenv() {
            debug!(error = %e, "no .env file loaded");
        }

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents).map_err(|source| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Override fields with the variables `lookup` knows about. Empty values
    /// count as unset.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = lookup(ANTHROPIC_API_KEY) {
            self.anthropic_api_key = Some(key);
        }
        if let Some(key) = lookup(OPENAI_API_KEY) {
            self.openai_api_key = Some(key);
        }
        if let Some(model) = lookup(ANTHROPIC_MODEL) {
            self.anthropic_model = model;
        }
        if let Some(model) = lookup(OPENAI_MODEL) {
            self.openai_model = model;
        }
        if let Some(value) = parse_var(&lookup, MAX_TOKENS)? {
            self.max_tokens = value;
        }
        if let Some(value) = parse_var(&lookup, MAX_REQUESTS_PER_MINUTE)? {
            self.max_requests_per_minute = value;
        }
        if let Some(value) = parse_var(&lookup, RETRY_MAX_ATTEMPTS)? {
            self.retry_max_attempts = value;
        }
        if let Some(value) = parse_var(&lookup, RETRY_DELAY_SECS)? {
            self.retry_delay_secs = value;
        }
        Ok(())
    }

    /// Check that both API keys are present and the middleware settings are
    /// usable.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.anthropic_api_key.is_none() {
            return Err(ConfigurationError::MissingVar(ANTHROPIC_API_KEY));
        }
        if self.openai_api_key.is_none() {
            return Err(ConfigurationError::MissingVar(OPENAI_API_KEY));
        }
        self.rate_limiter()?;
        self.retry_policy()?;
        Ok(())
    }

    /// A limiter allowing `max_requests_per_minute` calls per 60 seconds.
    pub fn rate_limiter(&self) -> Result<RateLimiter, ConfigurationError> {
        RateLimiter::new(self.max_requests_per_minute, Duration::from_secs(60))
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigurationError> {
        RetryPolicy::from_secs_f64(self.retry_max_attempts, self.retry_delay_secs)
    }

    pub fn retry_executor(&self) -> Result<RetryExecutor, ConfigurationError> {
        Ok(RetryExecutor::new(self.retry_policy()?))
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigurationError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(ConfigurationError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        },
    }
}
