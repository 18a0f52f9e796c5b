//! LLM — the language-model provider behind `/api/chat`.
//!
//! DESIGN
//! ======
//! Configured from environment variables. `LlmClient` owns the prompt and
//! sampling settings and talks to any OpenAI-compatible chat completions
//! endpoint. Handlers only see the [`LlmChat`] trait.

pub mod config;
pub mod openai;
pub mod types;

use config::LlmConfig;
use openai::{CompletionParams, OpenAiClient};
pub use types::LlmChat;
use types::{ChatReply, LlmError};

/// Concrete LLM client for the chat endpoint.
pub struct LlmClient {
    inner: OpenAiClient,
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: String,
}

impl LlmClient {
    /// Build an LLM client from environment variables. See [`LlmConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(config)
    }

    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let inner = OpenAiClient::new(config.api_key, config.base_url, config.timeouts)?;
        Ok(Self {
            inner,
            model: config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system_prompt: config.system_prompt,
        })
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, message: &str) -> Result<ChatReply, LlmError> {
        let params = CompletionParams { model: &self.model, max_tokens: self.max_tokens, temperature: self.temperature };
        self.inner.chat(params, &self.system_prompt, message).await
    }
}
