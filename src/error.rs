use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Routing was attempted before any semantic index exists.
    #[error("Semantic index not ready")]
    IndexNotReady,

    /// The index search returned zero documents (empty catalog).
    #[error("Semantic search returned no candidates")]
    NoCandidates,

    #[error("Model inference failed: {0}")]
    ModelError(String),

    #[error("Tokenization failed: {0}")]
    TokenizationError(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Service temporarily unavailable: {0}")]
    ResourceError(String),

    /// External text generation failed. Absorbed by the response composer
    /// (template fallback) and never surfaced to HTTP callers.
    #[error("Response generation failed: {0}")]
    GenerationError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::IndexNotReady | AppError::NoCandidates => {
                tracing::warn!(error = %self, "Routing unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::ModelError(e) => {
                tracing::error!(error = %e, "Model inference error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::TokenizationError(msg) => {
                tracing::error!(error = %msg, "Tokenization error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Validation error");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::ResourceError(msg) => {
                tracing::warn!(error = %msg, "Resource error");
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            AppError::GenerationError(msg) => {
                tracing::error!(error = %msg, "Generation error leaked to HTTP layer");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<ort::Error> for AppError {
    fn from(err: ort::Error) -> Self {
        AppError::ModelError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
