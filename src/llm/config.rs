//! LLM configuration parsed from environment variables.

use super::types::LlmError;

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano-2025-04-14";
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly assistant embedded in a personal website's chat \
widget. Answer questions about the site owner's work and projects. Be conversational, helpful and \
occasionally witty. Keep answers under 150 tokens.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Build typed LLM config from environment variables.
    ///
    /// Required:
    /// - the API key, read from the variable named by `LLM_API_KEY_ENV`
    ///   (default `OPENAI_API_KEY`)
    ///
    /// Optional:
    /// - `LLM_MODEL`: default `gpt-4.1-nano-2025-04-14`
    /// - `LLM_BASE_URL`: default OpenAI API base URL
    /// - `LLM_MAX_TOKENS`: default 150
    /// - `LLM_TEMPERATURE`: default 0.7
    /// - `LLM_SYSTEM_PROMPT`: built-in assistant prompt when absent
    /// - `LLM_REQUEST_TIMEOUT_SECS`: default 5
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] when the key is unset or blank, and
    /// [`LlmError::ConfigParse`] for an out-of-range temperature.
    pub fn from_env() -> Result<Self, LlmError> {
        let key_var = std::env::var("LLM_API_KEY_ENV").unwrap_or_else(|_| DEFAULT_API_KEY_ENV.to_string());
        let api_key = std::env::var(&key_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey { var: key_var.clone() })?;

        let base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let temperature = env_parse("LLM_TEMPERATURE", DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(LlmError::ConfigParse(format!("LLM_TEMPERATURE out of range: {temperature}")));
        }
        let timeouts = LlmTimeouts {
            request_secs: env_parse("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key,
            model: model_from_env(),
            base_url,
            max_tokens: env_parse("LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            temperature,
            system_prompt: std::env::var("LLM_SYSTEM_PROMPT").unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string()),
            timeouts,
        })
    }
}

/// Model name from `LLM_MODEL`, also used for status reporting when no
/// client could be built.
#[must_use]
pub fn model_from_env() -> String {
    std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
