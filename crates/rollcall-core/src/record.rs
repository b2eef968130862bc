//! Attendance record types — the append-only log entries of the store.
//!
//! A record's identity fields never change after creation. The only
//! permitted mutation is attaching a [`ScoreEntry`] through
//! [`crate::store::AttendanceStore::score_student`]; records are never
//! deleted.

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether the student was present for the session the record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
  Present,
  Absent,
  Late,
}

/// How presence was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
  Qr,
  FaceRecognition,
  Gps,
  Manual,
}

/// A participation score attached to a record after the fact by staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
  pub value:     f32,
  /// The attendance date the score applies to.
  pub date:      NaiveDate,
  /// When the score was entered.
  pub time:      NaiveTime,
  pub scored_by: String,
}

/// One attendance mark. Identity fields are immutable once created; only
/// `score` may be set, and only by a scoring operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub record_id:     Uuid,
  pub student_id:    String,
  pub course_id:     String,
  pub course_name:   String,
  pub date:          NaiveDate,
  pub time:          NaiveTime,
  pub status:        AttendanceStatus,
  pub method:        VerificationMethod,
  pub location:      Option<String>,
  pub lecturer_name: Option<String>,
  pub score:         Option<ScoreEntry>,
}

/// Input to [`crate::store::AttendanceStore::mark_attendance`].
/// The `record_id` is always assigned by the store; scores arrive later.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
  pub student_id:    String,
  pub course_id:     String,
  pub course_name:   String,
  pub date:          NaiveDate,
  pub time:          NaiveTime,
  pub status:        AttendanceStatus,
  pub method:        VerificationMethod,
  pub location:      Option<String>,
  pub lecturer_name: Option<String>,
}

impl NewAttendanceRecord {
  /// Convenience constructor stamped with the current date and time.
  pub fn now(
    student_id: impl Into<String>,
    course_id: impl Into<String>,
    course_name: impl Into<String>,
    status: AttendanceStatus,
    method: VerificationMethod,
  ) -> Self {
    let now = Utc::now();
    Self {
      student_id:    student_id.into(),
      course_id:     course_id.into(),
      course_name:   course_name.into(),
      date:          now.date_naive(),
      time:          now.time(),
      status,
      method,
      location:      None,
      lecturer_name: None,
    }
  }
}
