//! [`AttendanceStore`] — the single source of truth for records, students,
//! the active session, and notifications.
//!
//! All mutations go through discrete operations on the store; nothing
//! writes fields directly. A mutex serialises writers, and a `watch`
//! revision channel lets read-surface observers re-render on change without
//! polling the data itself. No operation here blocks on I/O, and no failed
//! operation leaves the store unusable.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  notification::{Notification, NotificationQueue, Severity},
  record::{AttendanceRecord, NewAttendanceRecord, ScoreEntry},
  session::{ActiveSession, SessionToken},
  student::Student,
};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct State {
  /// Most-recent-first append-only log. Callers needing chronological
  /// order sort explicitly.
  records:       Vec<AttendanceRecord>,
  students:      Vec<Student>,
  session:       Option<ActiveSession>,
  notifications: NotificationQueue,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Cloning is cheap — clones share the same underlying state and revision
/// channel.
#[derive(Clone)]
pub struct AttendanceStore {
  inner:    Arc<Mutex<State>>,
  revision: Arc<watch::Sender<u64>>,
}

impl Default for AttendanceStore {
  fn default() -> Self {
    Self::new()
  }
}

impl AttendanceStore {
  pub fn new() -> Self {
    let (revision, _) = watch::channel(0);
    Self {
      inner:    Arc::new(Mutex::new(State::default())),
      revision: Arc::new(revision),
    }
  }

  fn lock(&self) -> MutexGuard<'_, State> {
    // Operations never leave partial state behind, so a poisoned lock is
    // still coherent.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn bump(&self) {
    self.revision.send_modify(|r| *r += 1);
  }

  // ── Records ───────────────────────────────────────────────────────────

  /// Append a record at the head of the log, assigning a fresh unique id.
  ///
  /// No session-token checking happens here — validating untrusted scan
  /// input is the verification bridge's job before it calls this.
  pub fn mark_attendance(&self, input: NewAttendanceRecord) -> Result<AttendanceRecord> {
    if input.student_id.trim().is_empty() {
      return Err(Error::EmptyField("student_id"));
    }
    if input.course_id.trim().is_empty() {
      return Err(Error::EmptyField("course_id"));
    }

    let record = AttendanceRecord {
      record_id:     Uuid::new_v4(),
      student_id:    input.student_id,
      course_id:     input.course_id,
      course_name:   input.course_name,
      date:          input.date,
      time:          input.time,
      status:        input.status,
      method:        input.method,
      location:      input.location,
      lecturer_name: input.lecturer_name,
      score:         None,
    };

    self.lock().records.insert(0, record.clone());
    self.bump();
    Ok(record)
  }

  /// Attach a score to every record matching `(student_id, date)` and
  /// return the match count. Zero matches is a no-op, not an error;
  /// repeated calls overwrite (last write wins).
  pub fn score_student(
    &self,
    student_id: &str,
    date: NaiveDate,
    value: f32,
    scored_by: &str,
  ) -> usize {
    let now = Utc::now();
    let mut updated = 0;

    {
      let mut state = self.lock();
      for record in &mut state.records {
        if record.student_id == student_id && record.date == date {
          record.score = Some(ScoreEntry {
            value,
            date,
            time: now.time(),
            scored_by: scored_by.to_owned(),
          });
          updated += 1;
        }
      }
    }

    if updated > 0 {
      self.bump();
    }
    updated
  }

  // ── Session ───────────────────────────────────────────────────────────

  /// Open a session. Rejects with [`Error::SessionActive`] when one is
  /// already open — callers choose the explicit
  /// [`supersede_session`](Self::supersede_session) path instead.
  pub fn start_session(
    &self,
    course_id: impl Into<String>,
    course_name: impl Into<String>,
    token: SessionToken,
  ) -> Result<ActiveSession> {
    let course_id = course_id.into();
    if course_id.trim().is_empty() {
      return Err(Error::EmptyField("course_id"));
    }

    let session = {
      let mut state = self.lock();
      if let Some(active) = &state.session {
        return Err(Error::SessionActive(active.course_id.clone()));
      }
      let session = ActiveSession {
        course_id,
        course_name: course_name.into(),
        started_at: Utc::now(),
        token,
      };
      state.session = Some(session.clone());
      session
    };

    self.bump();
    Ok(session)
  }

  /// Open a session, replacing any active one. Never silent: this is the
  /// deliberate force path, and the displaced session is returned.
  pub fn supersede_session(
    &self,
    course_id: impl Into<String>,
    course_name: impl Into<String>,
    token: SessionToken,
  ) -> Result<(ActiveSession, Option<ActiveSession>)> {
    let course_id = course_id.into();
    if course_id.trim().is_empty() {
      return Err(Error::EmptyField("course_id"));
    }

    let (session, displaced) = {
      let mut state = self.lock();
      let session = ActiveSession {
        course_id,
        course_name: course_name.into(),
        started_at: Utc::now(),
        token,
      };
      let displaced = state.session.replace(session.clone());
      (session, displaced)
    };

    self.bump();
    Ok((session, displaced))
  }

  /// Close the active session. Idempotent: ending when none is active is a
  /// no-op.
  pub fn end_session(&self) {
    let ended = self.lock().session.take().is_some();
    if ended {
      self.bump();
    }
  }

  // ── Roster ────────────────────────────────────────────────────────────

  /// Replace the roster wholesale. Students are reference data owned by an
  /// external collaborator; the store never edits them piecemeal.
  pub fn load_roster(&self, students: Vec<Student>) {
    self.lock().students = students;
    self.bump();
  }

  // ── Notifications ─────────────────────────────────────────────────────

  pub fn add_notification(
    &self,
    message: impl Into<String>,
    severity: Severity,
  ) -> Notification {
    let notification = self.lock().notifications.add(message, severity);
    self.bump();
    notification
  }

  /// Removing an absent id is a no-op.
  pub fn remove_notification(&self, id: Uuid) {
    let removed = self.lock().notifications.remove(id);
    if removed {
      self.bump();
    }
  }

  // ── Read surface ──────────────────────────────────────────────────────

  /// Snapshot of the full record log, newest first.
  pub fn records(&self) -> Vec<AttendanceRecord> {
    self.lock().records.clone()
  }

  /// Snapshot of the records matching `(student_id, date)`.
  pub fn records_for(&self, student_id: &str, date: NaiveDate) -> Vec<AttendanceRecord> {
    self
      .lock()
      .records
      .iter()
      .filter(|r| r.student_id == student_id && r.date == date)
      .cloned()
      .collect()
  }

  pub fn students(&self) -> Vec<Student> {
    self.lock().students.clone()
  }

  pub fn active_session(&self) -> Option<ActiveSession> {
    self.lock().session.clone()
  }

  pub fn notifications(&self) -> Vec<Notification> {
    self.lock().notifications.entries().to_vec()
  }

  /// Monotonic mutation counter; pairs with [`subscribe`](Self::subscribe).
  pub fn revision(&self) -> u64 {
    *self.revision.borrow()
  }

  /// Observe state changes. The receiver yields a new revision after every
  /// mutation; observers re-read the snapshots they care about.
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.revision.subscribe()
  }
}
