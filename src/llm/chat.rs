use std::fmt;

use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::{ChatMessage, ChatRole, MessageType};
use tokio::runtime::Runtime;
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};

use crate::error::ProviderError;

const API_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-message overrides for `send_message_with`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOptions {
    /// Model to use instead of the client's default
    pub model: Option<String>,
    /// Maximum tokens in the response
    pub max_tokens: Option<u32>,
}

impl MessageOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    Anthropic,
    OpenAi,
}

impl Backend {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    fn llm_backend(self) -> LLMBackend {
        match self {
            Self::Anthropic => LLMBackend::Anthropic,
            Self::OpenAi => LLMBackend::OpenAI,
        }
    }
}

/// Blocking single-message chat over one `llm` backend.
///
/// Owns a current-thread runtime and blocks on it, so it must not be called
/// from inside another async runtime.
pub(crate) struct ChatClient {
    backend: Backend,
    api_key: String,
    model: String,
    max_tokens: u32,
    runtime: Runtime,
}

impl ChatClient {
    pub(crate) fn new(
        backend: Backend,
        api_key: String,
        model: String,
        max_tokens: u32,
    ) -> Result<Self, ProviderError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            backend,
            api_key,
            model,
            max_tokens,
            runtime,
        })
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn set_model(&mut self, model: String) {
        self.model = model;
    }

    pub(crate) fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub(crate) fn send(
        &self,
        message: &str,
        options: &MessageOptions,
    ) -> Result<String, ProviderError> {
        let provider = self.backend.name();
        let model = options.model.as_deref().unwrap_or(&self.model);
        let max_tokens = options.max_tokens.unwrap_or(self.max_tokens);

        // The llm crate fixes model and max_tokens at build time, so per-message
        // overrides need a fresh backend client.
        let llm = LLMBuilder::new()
            .backend(self.backend.llm_backend())
            .api_key(&self.api_key)
            .model(model)
            .max_tokens(max_tokens)
            .build()
            .map_err(|e| ProviderError::Build {
                provider,
                message: e.to_string(),
            })?;

        let messages = vec![ChatMessage {
            role: ChatRole::User,
            message_type: MessageType::Text,
            content: message.to_string(),
        }];

        debug!(provider, model, max_tokens, "sending message");
        let response = self
            .runtime
            .block_on(async { timeout(API_TIMEOUT, llm.chat(&messages)).await })
            .map_err(|_| ProviderError::Timeout {
                provider,
                after_secs: API_TIMEOUT.as_secs(),
            })?
            .map_err(|e| ProviderError::Request {
                provider,
                message: e.to_string(),
            })?;

        Ok(response.text().unwrap_or_else(|| {
            warn!(provider, "API returned empty or missing response text");
            String::new()
        }))
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}
