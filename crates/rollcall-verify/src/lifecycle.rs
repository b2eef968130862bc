//! [`SessionLifecycle`] — starting and ending class sessions.
//!
//! Owns the token minting policy. The store enforces session exclusivity;
//! this layer decides what a token looks like and how long it lives.

use chrono::Utc;

use rollcall_core::{
  session::{ActiveSession, SessionToken, TokenPolicy},
  store::AttendanceStore,
};

use crate::Result;

#[derive(Clone)]
pub struct SessionLifecycle {
  store:  AttendanceStore,
  policy: TokenPolicy,
}

impl SessionLifecycle {
  pub fn new(store: AttendanceStore, policy: TokenPolicy) -> Self {
    Self { store, policy }
  }

  /// Mint a token and open a session. Fails with a conflict if one is
  /// already active; see [`start_superseding`](Self::start_superseding) for
  /// the explicit force path.
  pub fn start(
    &self,
    course_id: impl Into<String>,
    course_name: impl Into<String>,
  ) -> Result<ActiveSession> {
    let token = SessionToken::mint(self.policy);
    let session = self.store.start_session(course_id, course_name, token)?;
    tracing::info!(course_id = %session.course_id, "session started");
    Ok(session)
  }

  /// Mint a token and open a session, replacing any active one.
  pub fn start_superseding(
    &self,
    course_id: impl Into<String>,
    course_name: impl Into<String>,
  ) -> Result<ActiveSession> {
    let token = SessionToken::mint(self.policy);
    let (session, displaced) =
      self.store.supersede_session(course_id, course_name, token)?;
    match displaced {
      Some(old) => tracing::warn!(
        course_id = %session.course_id,
        displaced = %old.course_id,
        "session superseded an active one",
      ),
      None => tracing::info!(course_id = %session.course_id, "session started"),
    }
    Ok(session)
  }

  /// Invalidate the token and close the session. Idempotent.
  pub fn end(&self) {
    self.store.end_session();
    tracing::info!("session ended");
  }

  /// The code the lecturer-facing QR surface renders right now. `None`
  /// when no session is active or its token is past maximum lifetime.
  pub fn current_code(&self) -> Option<String> {
    let session = self.store.active_session()?;
    let now = Utc::now();
    if session.token.expired(now) {
      return None;
    }
    Some(session.token.current_code(now))
  }
}
