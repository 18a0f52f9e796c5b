//! OpenAI-compatible `/chat/completions` client.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::config::LlmTimeouts;
use super::types::{ChatReply, LlmError};

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// Sampling parameters for one completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key, base_url })
    }

    pub async fn chat(&self, params: CompletionParams<'_>, system: &str, message: &str) -> Result<ChatReply, LlmError> {
        let messages = build_messages(system, message);
        let body = CcRequest {
            model: params.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: &messages,
        };
        let text = self.send_json("/chat/completions", &body).await?;
        parse_chat_completions_response(&text)
    }

    async fn send_json(&self, path: &str, body: &impl Serialize) -> Result<String, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }
        Ok(text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: &'a [CcMessage<'a>],
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct CcMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn build_messages<'a>(system: &'a str, message: &'a str) -> Vec<CcMessage<'a>> {
    let mut out = Vec::with_capacity(2);
    if !system.trim().is_empty() {
        out.push(CcMessage { role: "system", content: system });
    }
    out.push(CcMessage { role: "user", content: message });
    out
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

pub(crate) fn parse_chat_completions_response(json_text: &str) -> Result<ChatReply, LlmError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    let model = root
        .get("model")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default();
    let input_tokens = root
        .get("usage")
        .and_then(|u| u.get("prompt_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let output_tokens = root
        .get("usage")
        .and_then(|u| u.get("completion_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let Some(choice) = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
    else {
        return Err(LlmError::ApiParse("chat_completions: missing choices[0]".to_string()));
    };
    let Some(text) = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
    else {
        return Err(LlmError::ApiParse("chat_completions: missing message content".to_string()));
    };

    Ok(ChatReply { text: text.trim().to_string(), model, input_tokens, output_tokens })
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
