mod settings;

pub use settings::{
    ANTHROPIC_API_KEY, ANTHROPIC_MODEL, Config, MAX_REQUESTS_PER_MINUTE, MAX_TOKENS,
    OPENAI_API_KEY, OPENAI_MODEL, RETRY_DELAY_SECS, RETRY_MAX_ATTEMPTS,
};
