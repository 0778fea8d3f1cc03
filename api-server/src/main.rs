//! Housing Value Predictor - HTTP Server
//!
//! Serves one pre-trained regression model behind a validated JSON API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  HOUSING VALUE PREDICTOR                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────┐  ┌───────────────────────┐  │
//! │  │  API      │  │  Validator  │  │  Predictor            │  │
//! │  │  (Axum)   │─►│  (schema)   │─►│  (vector → model)     │  │
//! │  └───────────┘  └─────────────┘  └───────────┬───────────┘  │
//! │                                              ▼              │
//! │                                  ┌───────────────────────┐  │
//! │                                  │ Model artifact (R/O)  │  │
//! │                                  └───────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod handlers;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use housing_core::constants::{APP_NAME, APP_VERSION};
use housing_core::PredictionService;
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so RUST_LOG from it applies
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "housing_server=debug,housing_core=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()
        .context("Invalid configuration")?;

    tracing::info!("{} v{} starting...", APP_NAME, APP_VERSION);
    tracing::info!("Environment: {}", config.environment);

    // Model load failure is fatal: nothing is served without it
    let schema = config.load_schema()
        .context("Failed to load feature schema")?;
    let service = PredictionService::load(
        &config.model_path,
        config.model_sha256.as_deref(),
        schema,
        config.output_transform,
    )
    .with_context(|| format!("Failed to load model from {}", config.model_path))?;

    tracing::info!(
        "Model ready: {} ({} features, layout {:08x})",
        service.model_metadata().model_type,
        service.schema().len(),
        service.schema().layout_hash()
    );

    // Build application state
    let state = AppState {
        service: Arc::new(service),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let cors = if state.config.is_production() {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict_api", post(handlers::predict::predict))
        .route("/api/v1/schema", get(handlers::schema::get))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
