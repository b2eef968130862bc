//! Handlers for `/records` and `/students`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records` | optional `student_id`, `date` filters |
//! | `POST` | `/records` | manual/GPS marking; returns 201 + stored record |
//! | `POST` | `/records/score` | staff only; returns the updated count |
//! | `GET`  | `/students` | roster snapshot |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;

use rollcall_core::{
  record::{AttendanceRecord, AttendanceStatus, NewAttendanceRecord, VerificationMethod},
  student::Student,
};

use crate::{AppState, error::ApiError, identity::Actor};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub student_id: Option<String>,
  pub date:       Option<NaiveDate>,
}

/// `GET /records[?student_id=...][&date=...]` — newest first.
pub async fn list(
  State(state): State<AppState>,
  _actor: Actor,
  Query(params): Query<ListParams>,
) -> Json<Vec<AttendanceRecord>> {
  let mut records = state.store.records();
  if let Some(student_id) = &params.student_id {
    records.retain(|r| &r.student_id == student_id);
  }
  if let Some(date) = params.date {
    records.retain(|r| r.date == date);
  }
  Json(records)
}

/// `GET /students`
pub async fn students(
  State(state): State<AppState>,
  _actor: Actor,
) -> Json<Vec<Student>> {
  Json(state.store.students())
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /records`.
#[derive(Debug, Deserialize)]
pub struct NewRecordBody {
  pub student_id:    String,
  pub course_id:     String,
  pub course_name:   String,
  /// Defaults to today / now when omitted.
  pub date:          Option<NaiveDate>,
  pub time:          Option<NaiveTime>,
  pub status:        Option<AttendanceStatus>,
  pub method:        VerificationMethod,
  pub location:      Option<String>,
  pub lecturer_name: Option<String>,
}

/// `POST /records` — the manual-entry path.
///
/// QR and face records are committed by the verification bridge after
/// token/stability validation; accepting them here would bypass it.
pub async fn create(
  State(state): State<AppState>,
  actor: Actor,
  Json(body): Json<NewRecordBody>,
) -> Result<impl IntoResponse, ApiError> {
  if matches!(
    body.method,
    VerificationMethod::Qr | VerificationMethod::FaceRecognition
  ) {
    return Err(ApiError::BadRequest(
      "method is reserved for scan verification".into(),
    ));
  }

  let now = Utc::now();
  let record = state.store.mark_attendance(NewAttendanceRecord {
    student_id:    body.student_id,
    course_id:     body.course_id,
    course_name:   body.course_name,
    date:          body.date.unwrap_or_else(|| now.date_naive()),
    time:          body.time.unwrap_or_else(|| now.time()),
    status:        body.status.unwrap_or(AttendanceStatus::Present),
    method:        body.method,
    location:      body.location,
    lecturer_name: body.lecturer_name.or_else(|| {
      actor.is_staff().then(|| actor.id.clone())
    }),
  })?;

  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Score ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
  pub student_id: String,
  pub date:       NaiveDate,
  pub score:      f32,
}

/// `POST /records/score` — staff only. Scoring a `(student_id, date)` pair
/// with no matching records is a no-op and reports `"updated": 0`.
pub async fn score(
  State(state): State<AppState>,
  actor: Actor,
  Json(body): Json<ScoreBody>,
) -> Result<impl IntoResponse, ApiError> {
  if !actor.is_staff() {
    return Err(ApiError::Forbidden("only staff may score records".into()));
  }

  let updated =
    state
      .store
      .score_student(&body.student_id, body.date, body.score, &actor.id);
  Ok(Json(json!({ "updated": updated })))
}
