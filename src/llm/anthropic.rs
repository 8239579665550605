use super::chat::{Backend, ChatClient, MessageOptions};
use crate::config::{ANTHROPIC_API_KEY, Config};
use crate::error::ProviderError;

/// Blocking client for the Anthropic Messages API
#[derive(Debug)]
pub struct ClaudeClient {
    inner: ChatClient,
}

impl ClaudeClient {
    /// Create a client from the Anthropic key, model and token limit in `config`.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let api_key = config
            .anthropic_api_key
            .clone()
            .ok_or(ProviderError::MissingApiKey {
                var: ANTHROPIC_API_KEY,
            })?;

        Ok(Self {
            inner: ChatClient::new(
                Backend::Anthropic,
                api_key,
                config.anthropic_model.clone(),
                config.max_tokens,
            )?,
        })
    }

    /// Use a different default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.inner.set_model(model.into());
        self
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }

    pub fn max_tokens(&self) -> u32 {
        self.inner.max_tokens()
    }

    /// Send a single user message and return Claude's reply text.
    pub fn send_message(&self, message: &str) -> Result<String, ProviderError> {
        self.send_message_with(message, &MessageOptions::default())
    }

    pub fn send_message_with(
        &self,
        message: &str,
        options: &MessageOptions,
    ) -> Result<String, ProviderError> {
        self.inner.send(message, options)
    }
}
