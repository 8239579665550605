use super::chat::{Backend, ChatClient, MessageOptions};
use crate::config::{Config, OPENAI_API_KEY};
use crate::error::ProviderError;

/// Blocking client for the OpenAI Chat Completions API
#[derive(Debug)]
pub struct OpenAiClient {
    inner: ChatClient,
}

impl OpenAiClient {
    /// Create a client from the OpenAI key, model and token limit in `config`.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(ProviderError::MissingApiKey {
                var: OPENAI_API_KEY,
            })?;

        Ok(Self {
            inner: ChatClient::new(
                Backend::OpenAi,
                api_key,
                config.openai_model.clone(),
                config.max_tokens,
            )?,
        })
    }

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

    /// Send a single user message and return the first choice's text.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let err = OpenAiClient::new(&Config::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "OPENAI_API_KEY not found in environment variables"
        );
    }

    #[test]
    fn test_uses_configured_model() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            openai_model: "gpt-4o-mini".to_string(),
            ..Config::default()
        };

        let client = OpenAiClient::new(&config).expect("create client");
        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(client.max_tokens(), 1024);
    }
}
