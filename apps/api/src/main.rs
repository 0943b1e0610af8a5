mod assessment;
mod config;
mod errors;
mod interview;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::store::SessionStore;
use crate::llm_client::provider::GeminiProvider;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Talent Scout v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client. A listing without any preferred model is fatal;
    // an unreachable listing only degrades the client.
    let provider = GeminiProvider::new(
        config.google_api_key.clone(),
        config.gemini_api_base.clone(),
    )
    .context("Failed to build the Gemini HTTP client")?;
    let policy = RetryPolicy::default().with_rate_limit_delay(config.rate_limit_delay);
    let llm = LlmClient::connect(Arc::new(provider), &config.preferred_models, policy)
        .await
        .context("Failed to configure the Gemini model")?;
    match llm.model() {
        Some(model) => info!("LLM client initialized (model: {model})"),
        None => info!("LLM client initialized in degraded mode"),
    }
    info!(
        "LLM calls retry up to {} times, worst-case wait {}s",
        llm.policy().max_attempts,
        llm.policy().worst_case_wait().as_secs()
    );

    let state = AppState {
        llm,
        sessions: SessionStore::new(),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
