// Main entry point for the audit server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use audit::ai::{GeminiOcr, GeminiReasoner, GeminiTranscriber};
use audit::testing::MemoryAuditStore;
use audit::{FsRuleRepository, HttpFetcher, Pipeline, PipelineConfig, Services};
use gemini_client::GeminiClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audit_server::app::{build_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,audit=debug,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting compliance audit server");

    let config = PipelineConfig::from_env();
    tracing::info!(rules_root = %config.rules_root, "Configuration loaded");

    // One Gemini client serves the reasoner, OCR, and transcriber seams.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .context("failed to build HTTP client")?;
    let gemini = GeminiClient::from_env()
        .context("GEMINI_API_KEY is required")?
        .with_http_client(http);

    let store = Arc::new(MemoryAuditStore::new());
    let services = Services {
        reasoner: Arc::new(GeminiReasoner::new(gemini.clone())),
        transcriber: Arc::new(GeminiTranscriber::new(gemini.clone())),
        ocr: Arc::new(GeminiOcr::new(gemini)),
        rules: Arc::new(FsRuleRepository::new(config.rules_root.clone())),
        store: store.clone(),
        fetcher: Arc::new(HttpFetcher::new(config.fetch_timeout, config.max_media_size)),
    };

    let state = AppState {
        pipeline: Arc::new(Pipeline::new(services, config)),
        store,
    };
    let app = build_app(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
