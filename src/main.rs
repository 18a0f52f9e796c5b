mod config;
mod identity;
mod llm;
mod rate_limit;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use llm::LlmChat;
use rate_limit::window::SystemClock;
use rate_limit::{Ledger, QuotaPolicy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env()?;

    // Non-fatal: chat answers with a placeholder if the LLM is not configured.
    let llm: Option<Arc<dyn LlmChat>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client) as Arc<dyn LlmChat>)
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured; chat replies will be placeholders");
            None
        }
    };
    let model = llm
        .as_ref()
        .map_or_else(llm::config::model_from_env, |client| client.model().to_owned());

    let policy = QuotaPolicy::default();
    tracing::info!(
        global_hourly = policy.global_hourly,
        global_daily = policy.global_daily,
        client_hourly = policy.client_hourly,
        client_daily = policy.client_daily,
        "quota policy"
    );
    let state =
        state::AppState::new(Ledger::new(policy), Arc::new(SystemClock), llm, &model, config.cors_origins.clone());

    let app = routes::app(state);
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "chatgate listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("chatgate stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
