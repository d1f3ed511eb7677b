// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::speech::SpeechError;

/// Failures surfaced by `/process`. The body is always `{"error": <Display>}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Prompt is empty.")]
    EmptyPrompt,

    #[error("Invalid mode selected.")]
    InvalidMode(String),

    #[error("Invalid request body.")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmptyPrompt | AppError::InvalidMode(_) | AppError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SpeechError> for AppError {
    fn from(e: SpeechError) -> Self {
        AppError::Internal(format!("speech synthesis failed: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(details) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = %error_id, error = %details, "Error in /process");
            }
            AppError::InvalidMode(mode) => tracing::warn!("Rejected unknown mode {:?}", mode),
            AppError::InvalidBody(e) => tracing::warn!("Rejected request body: {}", e),
            AppError::EmptyPrompt => {}
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
