//! Handlers for `/session`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/session` | active session; rotating code for staff only |
//! | `POST`   | `/session` | start; `supersede: true` for the force path |
//! | `DELETE` | `/session` | end (idempotent) |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rollcall_core::session::ActiveSession;

use crate::{AppState, error::ApiError, identity::Actor};

// ─── View ─────────────────────────────────────────────────────────────────────

/// What callers see of the active session. The token secret never leaves
/// the process; staff get the current rotating code to render as a QR.
#[derive(Debug, Serialize)]
pub struct SessionView {
  pub course_id:   String,
  pub course_name: String,
  pub started_at:  DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub code:        Option<String>,
}

fn view(session: ActiveSession, code: Option<String>) -> SessionView {
  SessionView {
    course_id:   session.course_id,
    course_name: session.course_name,
    started_at:  session.started_at,
    code,
  }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// `GET /session` — `null` when no session is active.
pub async fn get_active(
  State(state): State<AppState>,
  actor: Actor,
) -> Json<Option<SessionView>> {
  let session = state.store.active_session();
  let code = actor
    .is_staff()
    .then(|| state.lifecycle.current_code())
    .flatten();
  Json(session.map(|s| view(s, code)))
}

#[derive(Debug, Deserialize)]
pub struct StartBody {
  pub course_id:   String,
  pub course_name: String,
  /// Explicitly replace an active session instead of conflicting.
  #[serde(default)]
  pub supersede:   bool,
}

/// `POST /session` — 201 with the session view, or 409 when one is active
/// and `supersede` was not requested.
pub async fn start(
  State(state): State<AppState>,
  actor: Actor,
  Json(body): Json<StartBody>,
) -> Result<impl IntoResponse, ApiError> {
  if !actor.is_staff() {
    return Err(ApiError::Forbidden("only staff may start sessions".into()));
  }

  let session = if body.supersede {
    state
      .lifecycle
      .start_superseding(body.course_id, body.course_name)?
  } else {
    state.lifecycle.start(body.course_id, body.course_name)?
  };

  let code = state.lifecycle.current_code();
  Ok((StatusCode::CREATED, Json(view(session, code))))
}

/// `DELETE /session` — idempotent.
pub async fn end(
  State(state): State<AppState>,
  actor: Actor,
) -> Result<StatusCode, ApiError> {
  if !actor.is_staff() {
    return Err(ApiError::Forbidden("only staff may end sessions".into()));
  }
  state.lifecycle.end();
  Ok(StatusCode::NO_CONTENT)
}
