//! HTTP surface: axum router over the shared prediction service.
//!
//! Routes:
//! - `POST /predict` runs the pipeline for one patient
//! - `GET /health` reports whether the artifacts loaded (always 200)

mod error;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub use error::ApiError;

use crate::application::{ArtifactPredictionService, ServiceStatus};
use crate::domain::{PatientInput, PredictionResult};

/// Service handle shared by every handler.
pub type SharedService = Arc<ArtifactPredictionService>;

/// Build the application router.
pub fn router(service: SharedService, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(cors)
        .with_state(service)
}

/// CORS policy: any origin when `origins` is `None`, otherwise the listed ones.
///
/// # Errors
/// Returns error if an origin is not a valid header value.
pub fn cors_layer(origins: Option<&[String]>) -> Result<CorsLayer> {
    let allow_origin = match origins {
        None => AllowOrigin::from(Any),
        Some(list) => {
            let values = list
                .iter()
                .map(|o| {
                    HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin {o:?}"))
                })
                .collect::<Result<Vec<_>>>()?;
            AllowOrigin::list(values)
        }
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

/// Bind `addr` and serve until Ctrl-C.
///
/// # Errors
/// Returns error if the listener cannot bind or the server fails.
pub async fn serve(addr: std::net::SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health(State(service): State<SharedService>) -> Json<ServiceStatus> {
    Json(service.status())
}

async fn predict(
    State(service): State<SharedService>,
    payload: Result<Json<PatientInput>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(input) = payload?;

    let span = tracing::info_span!("predict", request_id = %request_id());
    let result = span.in_scope(|| service.predict(&input))?;
    Ok(Json(result))
}

fn request_id() -> String {
    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 8] = rng.gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
