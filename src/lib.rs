pub mod config;
pub mod error;
pub mod llm;
pub mod middleware;

pub use config::Config;
pub use error::{ConfigurationError, ProviderError};
pub use llm::{ClaudeClient, MessageOptions, OpenAiClient};
pub use middleware::{
    Operation, RateLimited, RateLimiter, RetryExecutor, RetryPolicy, Retrying, SharedRateLimiter,
    WindowPolicy, retry,
};
