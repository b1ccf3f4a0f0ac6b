//! HTTP serving surface for classification requests
//!
//! A long-lived process holding one immutable checkpoint behind an
//! `Arc<InferenceEngine>`. The checkpoint load blocks before the listener is
//! bound; requests are read-only against the shared engine and handled in
//! parallel without coordination. Malformed request bodies are rejected by
//! the JSON extractor here, outside the classification core.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::infer::{Classification, InferenceEngine};

#[derive(Clone)]
struct AppState {
    engine: Arc<InferenceEngine>,
}

/// Classification request body
#[derive(Debug, Deserialize)]
pub struct DetectTextRequest {
    /// Input text of arbitrary length
    pub text: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Serve the engine on `host:port` until ctrl-c/SIGTERM
pub async fn run(engine: Arc<InferenceEngine>, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("langid server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

fn router(engine: Arc<InferenceEngine>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/detect-text", post(detect_text_handler))
        .with_state(AppState { engine })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.engine.checkpoint().version().to_string(),
    })
}

async fn detect_text_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectTextRequest>,
) -> Result<Json<Classification>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine.classify(&request.text) {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!("classification failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, starting graceful shutdown");
}
