//! `POST /api/chat` — forward one message to the LLM.
//!
//! Provider problems never surface as HTTP errors: the caller gets a normal
//! `ChatResponse` describing the failure, tagged with [`DownstreamFailure`]
//! so the quota gate leaves the request uncharged.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use super::gate::DownstreamFailure;
use super::now_rfc3339;
use crate::state::AppState;

pub const MAX_MESSAGE_CHARS: usize = 500;
pub const NOT_CONFIGURED_REPLY: &str = "API is running but the LLM API key needs to be configured.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl ChatResponse {
    fn new(response: String, started: Instant) -> Self {
        Self { response, timestamp: now_rfc3339(), response_time_ms: Some(elapsed_ms(started)) }
    }
}

pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Response {
    let started = Instant::now();

    if let Err(reason) = validate_message(&body.message) {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": reason }))).into_response();
    }

    let Some(llm) = &state.llm else {
        return degraded(NOT_CONFIGURED_REPLY.to_string(), started);
    };

    match llm.chat(&body.message).await {
        Ok(reply) => {
            info!(
                elapsed_ms = elapsed_ms(started),
                model = %reply.model,
                input_tokens = reply.input_tokens,
                output_tokens = reply.output_tokens,
                "chat response generated"
            );
            Json(ChatResponse::new(reply.text, started)).into_response()
        }
        Err(e) => {
            error!(error = %e, "chat completion failed");
            degraded(format!("Sorry, I encountered an error: {e}"), started)
        }
    }
}

pub(crate) fn validate_message(message: &str) -> Result<(), String> {
    if message.trim().is_empty() {
        return Err("message must not be empty".to_string());
    }
    let chars = message.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(format!("message must be at most {MAX_MESSAGE_CHARS} characters (got {chars})"));
    }
    Ok(())
}

fn degraded(text: String, started: Instant) -> Response {
    let mut response = Json(ChatResponse::new(text, started)).into_response();
    response.extensions_mut().insert(DownstreamFailure);
    response
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
