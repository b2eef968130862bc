//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),
}

impl From<rollcall_core::Error> for ApiError {
  fn from(e: rollcall_core::Error) -> Self {
    match e {
      rollcall_core::Error::EmptyField(_) => ApiError::BadRequest(e.to_string()),
      rollcall_core::Error::SessionActive(_) => ApiError::Conflict(e.to_string()),
    }
  }
}

impl From<rollcall_verify::Error> for ApiError {
  fn from(e: rollcall_verify::Error) -> Self {
    match e {
      rollcall_verify::Error::Store(inner) => inner.into(),
      other @ rollcall_verify::Error::AttemptOutstanding(_) => {
        ApiError::Conflict(other.to_string())
      }
      other @ rollcall_verify::Error::Capability(_) => {
        ApiError::BadRequest(other.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
