//! Mapping from pipeline errors to HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::CardioRiskError;

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(CardioRiskError),
    Request(JsonRejection),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Pipeline(CardioRiskError::ModelUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable")
            }
            Self::Pipeline(CardioRiskError::FeatureMismatch(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "feature_mismatch")
            }
            Self::Pipeline(CardioRiskError::Validation(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation")
            }
            Self::Pipeline(CardioRiskError::Prediction(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
            Self::Request(rejection) => (rejection.status(), "invalid_request"),
        }
    }
}

impl From<CardioRiskError> for ApiError {
    fn from(e: CardioRiskError) -> Self {
        Self::Pipeline(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::Request(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let detail = match &self {
            Self::Pipeline(e) => e.to_string(),
            Self::Request(rejection) => rejection.body_text(),
        };

        if status.is_server_error() {
            tracing::warn!("Request failed ({kind}): {detail}");
        } else {
            tracing::debug!("Request rejected ({kind}): {detail}");
        }

        (
            status,
            Json(ErrorBody {
                error: kind,
                detail,
            }),
        )
            .into_response()
    }
}
