mod config;
mod errors;
mod llm_client;
mod matching;
mod routes;
mod scoring;
mod state;
mod vocabulary;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::vocabulary::Vocabulary;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{crate_name}={level},tower_http={level}",
                crate_name = env!("CARGO_CRATE_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS score API v{}", env!("CARGO_PKG_VERSION"));

    // Compile vocabularies once; an invalid pattern stops startup here
    let vocab = Arc::new(Vocabulary::load()?);
    info!(
        "Vocabulary loaded: {} keyword patterns, {} technical skills",
        vocab.keyword_patterns.len(),
        vocab.technical_skills.len()
    );

    // Initialize LLM client
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    );
    if llm.is_configured() {
        info!(
            "LLM client initialized (model: {}, timeout: {}s)",
            llm_client::MODEL,
            config.llm_timeout_secs
        );
    } else {
        warn!("ANTHROPIC_API_KEY not set; every reasoning call will use its fallback");
    }
    info!(
        semantic_matching = config.enable_semantic_matching,
        service_scoring = config.enable_llm_category_scoring,
        "Feature flags"
    );

    let state = AppState {
        llm: Arc::new(llm),
        vocab,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
