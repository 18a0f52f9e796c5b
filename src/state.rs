//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and the quota gate via the
//! `State` extractor. The ledger is built by `main` and handed in, so tests
//! construct their own ledger and clock.

use std::sync::Arc;

use crate::llm::LlmChat;
use crate::rate_limit::Ledger;
use crate::rate_limit::window::Clock;

/// Clone is required by Axum; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
    pub clock: Arc<dyn Clock>,
    /// Optional LLM client. `None` if the API key is not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    /// Model name reported by the status endpoints.
    pub model: Arc<str>,
    pub cors_origins: Arc<[String]>,
}

impl AppState {
    #[must_use]
    pub fn new(
        ledger: Ledger,
        clock: Arc<dyn Clock>,
        llm: Option<Arc<dyn LlmChat>>,
        model: &str,
        cors_origins: Vec<String>,
    ) -> Self {
        Self { ledger, clock, llm, model: Arc::from(model), cors_origins: cors_origins.into() }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
