//! API error type and [`axum::response::IntoResponse`] implementation.

use std::time::Duration;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use reconcile_core::contact::ContactId;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request was understood but violates a precondition; never retried.
  #[error("{0}")]
  BadRequest(String),

  #[error("contact {0} not found")]
  NotFound(ContactId),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store call timed out after {0:?}")]
  Timeout(Duration),
}

impl From<reconcile_core::Error> for ApiError {
  fn from(e: reconcile_core::Error) -> Self {
    if e.is_validation() {
      ApiError::BadRequest(e.to_string())
    } else {
      ApiError::Store(Box::new(e))
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::BadRequest(message) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
          .into_response()
      }
      ApiError::NotFound(id) => (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("contact {id} not found") })),
      )
        .into_response(),
      internal => {
        tracing::error!(error = %internal, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({
            "error":   "Internal Server Error",
            "details": internal.to_string(),
          })),
        )
          .into_response()
      }
    }
  }
}
