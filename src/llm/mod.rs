mod anthropic;
mod chat;
mod openai;

pub use anthropic::ClaudeClient;
pub use chat::MessageOptions;
pub use openai::OpenAiClient;
