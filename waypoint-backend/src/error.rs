use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;

/// API error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<String>,
}

impl ErrorResponse {
  pub fn new(error: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      details: None,
    }
  }

  pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      details: Some(details.into()),
    }
  }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
  ValidationError(String),
  Unauthorized,
  ServerNotFound(String),
  IngestFailed(tokio::task::JoinError),
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    match self {
      AppError::ValidationError(msg) => {
        tracing::warn!(validation_error = %msg, "Validation failed");
        let error_response = ErrorResponse::new(msg);
        (StatusCode::BAD_REQUEST, Json(error_response)).into_response()
      }
      AppError::Unauthorized => {
        let error_response = ErrorResponse::new("Missing or invalid ingest token");
        (StatusCode::UNAUTHORIZED, Json(error_response)).into_response()
      }
      AppError::ServerNotFound(server) => {
        let error_response =
          ErrorResponse::with_details("Server has not reported any players", server);
        (StatusCode::NOT_FOUND, Json(error_response)).into_response()
      }
      AppError::IngestFailed(join_err) => {
        // Log the detailed error server-side
        tracing::error!(?join_err, "Ingest task failed");

        // Don't expose internals
        let error_response =
          ErrorResponse::new("An internal error occurred. Please try again later.");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response)).into_response()
      }
    }
  }
}

impl From<crate::validation::ValidationError> for AppError {
  fn from(err: crate::validation::ValidationError) -> Self {
    AppError::ValidationError(err.to_string())
  }
}

impl From<tokio::task::JoinError> for AppError {
  fn from(err: tokio::task::JoinError) -> Self {
    AppError::IngestFailed(err)
  }
}
