//! Handlers for `/notifications`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use rollcall_core::notification::{Notification, Severity};

use crate::{AppState, error::ApiError, identity::Actor};

/// `GET /notifications` — newest first, at most the queue capacity.
pub async fn list(
  State(state): State<AppState>,
  _actor: Actor,
) -> Json<Vec<Notification>> {
  Json(state.store.notifications())
}

#[derive(Debug, Deserialize)]
pub struct AddBody {
  pub message:  String,
  pub severity: Severity,
}

/// `POST /notifications` — returns 201 + the enqueued notification.
pub async fn create(
  State(state): State<AppState>,
  _actor: Actor,
  Json(body): Json<AddBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.message.trim().is_empty() {
    return Err(ApiError::BadRequest("message must not be empty".into()));
  }
  let notification = state.store.add_notification(body.message, body.severity);
  Ok((StatusCode::CREATED, Json(notification)))
}

/// `DELETE /notifications/{id}` — removing an absent id is a no-op.
pub async fn remove(
  State(state): State<AppState>,
  _actor: Actor,
  Path(id): Path<Uuid>,
) -> StatusCode {
  state.store.remove_notification(id);
  StatusCode::NO_CONTENT
}
