use std::path::PathBuf;

/// Invalid parameters or settings, reported at construction time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("max_calls must be greater than zero")]
    ZeroMaxCalls,

    #[error("rate limit window must be longer than zero")]
    ZeroWindow,

    #[error("max_attempts must be at least one")]
    ZeroMaxAttempts,

    #[error("{field} must be a finite, non-negative number of seconds, got {value}")]
    InvalidSeconds { field: &'static str, value: f64 },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0} not found in environment variables")]
    MissingVar(&'static str),
}

/// Failures of the Anthropic and OpenAI clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{var} not found in environment variables")]
    MissingApiKey { var: &'static str },

    #[error("failed to build {provider} client: {message}")]
    Build {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} API error: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} API call timed out after {after_secs} seconds")]
    Timeout {
        provider: &'static str,
        after_secs: u64,
    },

    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl ProviderError {
    /// Whether the failure is likely to go away on its own (network trouble,
    /// rate limiting, server-side errors, overload).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Request { message, .. } => is_transient_message(message),
            Self::MissingApiKey { .. } | Self::Build { .. } | Self::Runtime(_) => false,
        }
    }
}

fn is_transient_message(message: &str) -> bool {
    const MARKERS: &[&str] = &[
        // network/connection
        "connection",
        "timeout",
        "timed out",
        "network",
        // rate limiting
        "rate limit",
        "too many requests",
        "429",
        // server errors
        "500",
        "502",
        "503",
        "504",
        "internal server error",
        "bad gateway",
        "service unavailable",
        // overloaded
        "overloaded",
        "capacity",
    ];

    let message = message.to_lowercase();
    MARKERS.iter().any(|marker| message.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: &str) -> ProviderError {
        ProviderError::Request {
            provider: "anthropic",
            message: message.to_string(),
        }
    }

    #[test]
    fn test_transient_errors() {
        assert!(request("connection refused").is_transient());
        assert!(request("request timed out").is_transient());
        assert!(request("Rate limit exceeded").is_transient());
        assert!(request("503 Service Unavailable").is_transient());
        assert!(request("API overloaded").is_transient());
        assert!(
            ProviderError::Timeout {
                provider: "openai",
                after_secs: 120
            }
            .is_transient()
        );
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!request("invalid api key").is_transient());
        assert!(!request("model not found").is_transient());
        assert!(
            !ProviderError::MissingApiKey {
                var: "OPENAI_API_KEY"
            }
            .is_transient()
        );
    }

    #[test]
    fn test_missing_key_message() {
        let err = ProviderError::MissingApiKey {
            var: "ANTHROPIC_API_KEY",
        };
        assert_eq!(
            err.to_string(),
            "ANTHROPIC_API_KEY not found in environment variables"
        );
    }
}
