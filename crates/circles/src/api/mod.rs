//! HTTP surface: `/detect`, `/detect_base64` and `/extract`, plus service metadata.

pub mod error;
pub mod handlers;
pub mod models;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    algorithms::{CircleExtractor, Renderer},
    config::ServerConfig,
    error::Result,
    pipeline::{Detector, builder::DetectorBuilder},
};

pub use error::ApiError;
pub use models::*;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub detector: Arc<Detector>,
    pub renderer: Arc<Renderer>,
    pub extractor: CircleExtractor,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let renderer = config.renderer()?;
        let detector = DetectorBuilder::build_standard(config.detection);
        Ok(Self {
            config: Arc::new(config),
            detector: Arc::new(detector),
            renderer: Arc::new(renderer),
            extractor: CircleExtractor::default(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_content_length;

    Router::new()
        .route("/", get(handlers::index))
        .route("/info", get(handlers::info))
        .route("/detect", post(handlers::detect))
        .route("/detect_base64", post(handlers::detect_base64))
        .route("/extract", post(handlers::extract))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind to the configured address and serve until Ctrl+C
pub async fn serve(config: ServerConfig) -> color_eyre::Result<()> {
    let address = config.bind_address();
    let state = AppState::new(config)?;
    tracing::info!("{}", state.detector.info());

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Circle detection API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {:?}", e);
            }
            tracing::info!("Received Ctrl+C, shutting down gracefully");
        })
        .await?;

    tracing::info!("Circle detection API shut down");
    Ok(())
}
