//! [`ScanBridge`] — the per-modality verification state machine.
//!
//! An attempt runs `Scanning → Verifying → {Success | Failed(reason)}`,
//! driven by untrusted events from the platform capability. Exactly one
//! attempt per modality may be outstanding; a successful attempt commits
//! exactly one attendance record, even when the platform delivers its
//! callback twice; and once [`ScanBridge::stop`] returns, no event — even
//! one already buffered — can reach the store.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use rollcall_core::{
  record::{AttendanceStatus, NewAttendanceRecord, VerificationMethod},
  session::ActiveSession,
  store::AttendanceStore,
};

use crate::{
  capability::{Modality, ScanCapability, ScanEvent, ScanOptions, ScanPhase},
  error::{Error, Result},
};

// ─── Attempt state ───────────────────────────────────────────────────────────

/// Why an attempt ended without a record. A normal terminal outcome, not an
/// error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
  /// QR payload did not match the active session's rotating code.
  InvalidToken,
  /// There was no active session to verify against.
  NoActiveSession,
  /// No terminal event arrived within the configured bound.
  Timeout,
  /// Explicitly cancelled, or the platform closed the event stream.
  Cancelled,
  /// The store refused the write after verification passed.
  Rejected,
}

impl FailureReason {
  /// Stable reason code for logs and wire payloads.
  pub fn code(&self) -> &'static str {
    match self {
      Self::InvalidToken => "invalid_token",
      Self::NoActiveSession => "no_active_session",
      Self::Timeout => "timeout",
      Self::Cancelled => "cancelled",
      Self::Rejected => "rejected",
    }
  }
}

/// Observable state of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
  Idle,
  Scanning,
  Verifying,
  Success { record_id: Uuid },
  Failed(FailureReason),
}

impl AttemptState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Success { .. } | Self::Failed(_))
  }
}

/// The authenticated identity an attempt marks attendance for. Supplied by
/// the identity collaborator, never taken from scan payloads.
#[derive(Debug, Clone)]
pub struct ScanSubject {
  pub student_id: String,
  pub location:   Option<String>,
}

// ─── Bridge ──────────────────────────────────────────────────────────────────

/// Default bound on how long an attempt may run without a terminal event.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(45);

struct Attempt {
  state:     watch::Receiver<AttemptState>,
  /// Consumed by `stop`; wakes the driver task.
  cancel:    Option<oneshot::Sender<()>>,
  /// Set synchronously by `stop`, checked before any commit.
  cancelled: Arc<AtomicBool>,
}

impl Attempt {
  /// An attempt stops being outstanding once it reaches a terminal state
  /// or has been cancelled (the cancel flag makes a late commit
  /// impossible, so the slot can be reused immediately).
  fn outstanding(&self) -> bool {
    !self.state.borrow().is_terminal() && !self.cancelled.load(Ordering::Acquire)
  }
}

/// Mediates between the platform capability and the attendance store.
///
/// Cloning is cheap; clones share the attempt table.
#[derive(Clone)]
pub struct ScanBridge<C> {
  store:      AttendanceStore,
  capability: Arc<C>,
  timeout:    Duration,
  attempts:   Arc<Mutex<HashMap<Modality, Attempt>>>,
}

impl<C: ScanCapability> ScanBridge<C> {
  pub fn new(store: AttendanceStore, capability: Arc<C>) -> Self {
    Self::with_timeout(store, capability, DEFAULT_SCAN_TIMEOUT)
  }

  pub fn with_timeout(
    store: AttendanceStore,
    capability: Arc<C>,
    timeout: Duration,
  ) -> Self {
    Self {
      store,
      capability,
      timeout,
      attempts: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  fn attempts(&self) -> MutexGuard<'_, HashMap<Modality, Attempt>> {
    self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Current state for a modality; `Idle` when no attempt has run.
  pub fn state(&self, modality: Modality) -> AttemptState {
    self
      .attempts()
      .get(&modality)
      .map(|a| a.state.borrow().clone())
      .unwrap_or(AttemptState::Idle)
  }

  /// Open an attempt and return a watch on its state.
  ///
  /// Errors with [`Error::AttemptOutstanding`] while a previous attempt
  /// for the same modality is still live — callers cancel explicitly via
  /// [`stop`](Self::stop) first; nothing is torn down implicitly.
  pub async fn start(
    &self,
    modality: Modality,
    subject: ScanSubject,
  ) -> Result<watch::Receiver<AttemptState>> {
    if subject.student_id.trim().is_empty() {
      return Err(rollcall_core::Error::EmptyField("student_id").into());
    }

    let (state_tx, state_rx) = watch::channel(AttemptState::Scanning);
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let cancelled = Arc::new(AtomicBool::new(false));

    // Reserve the modality slot before any await so concurrent starts
    // cannot both pass the exclusivity check.
    {
      let mut attempts = self.attempts();
      if let Some(existing) = attempts.get(&modality)
        && existing.outstanding()
      {
        return Err(Error::AttemptOutstanding(modality));
      }
      attempts.insert(modality, Attempt {
        state:     state_rx.clone(),
        cancel:    Some(cancel_tx),
        cancelled: Arc::clone(&cancelled),
      });
    }

    let events = match self
      .capability
      .start_scan(modality, ScanOptions::for_modality(modality))
      .await
    {
      Ok(events) => events,
      Err(e) => {
        self.attempts().remove(&modality);
        return Err(Error::Capability(e.to_string()));
      }
    };

    tracing::debug!(%modality, student_id = %subject.student_id, "scan attempt opened");

    tokio::spawn(drive(
      self.store.clone(),
      Arc::clone(&self.capability),
      modality,
      subject,
      events,
      state_tx,
      cancel_rx,
      cancelled,
      self.timeout,
    ));

    Ok(state_rx)
  }

  /// Cancel an outstanding attempt. Returns immediately; from this point
  /// on no event for the attempt can mutate the store, including events
  /// already buffered. Stopping an idle or settled modality is a no-op.
  pub fn stop(&self, modality: Modality) {
    let mut attempts = self.attempts();
    if let Some(attempt) = attempts.get_mut(&modality) {
      attempt.cancelled.store(true, Ordering::Release);
      if let Some(cancel) = attempt.cancel.take() {
        let _ = cancel.send(());
        tracing::debug!(%modality, "scan attempt cancelled");
      }
    }
  }
}

// ─── Driver ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
async fn drive<C: ScanCapability>(
  store: AttendanceStore,
  capability: Arc<C>,
  modality: Modality,
  subject: ScanSubject,
  mut events: mpsc::Receiver<ScanEvent>,
  state: watch::Sender<AttemptState>,
  mut cancel: oneshot::Receiver<()>,
  cancelled: Arc<AtomicBool>,
  timeout: Duration,
) {
  let deadline = tokio::time::sleep(timeout);
  tokio::pin!(deadline);

  let outcome = loop {
    tokio::select! {
      // Biased: a cancellation or expiry must win over buffered events.
      biased;

      _ = &mut cancel => break AttemptState::Failed(FailureReason::Cancelled),
      _ = &mut deadline => break AttemptState::Failed(FailureReason::Timeout),

      event = events.recv() => match event {
        // The platform closed the stream without a terminal event.
        None => break AttemptState::Failed(FailureReason::Cancelled),
        Some(event) => {
          if let Some(terminal) = step(&store, modality, &subject, &cancelled, &state, event) {
            break terminal;
          }
        }
      }
    }
  };

  // Release the listener registration, then tear down the platform side.
  drop(events);
  if let Err(e) = capability.stop_scan(modality).await {
    tracing::warn!(%modality, error = %e, "platform stop_scan failed");
  }

  match &outcome {
    AttemptState::Success { record_id } => {
      tracing::info!(%modality, %record_id, "attendance verified");
    }
    AttemptState::Failed(reason) => {
      tracing::info!(%modality, reason = reason.code(), "attempt ended without a record");
    }
    _ => {}
  }
  let _ = state.send(outcome);
}

/// Process one event. Returns the terminal state when the attempt settles.
fn step(
  store: &AttendanceStore,
  modality: Modality,
  subject: &ScanSubject,
  cancelled: &AtomicBool,
  state: &watch::Sender<AttemptState>,
  event: ScanEvent,
) -> Option<AttemptState> {
  match event {
    ScanEvent::Phase { phase: ScanPhase::Verifying, .. } => {
      advance_to_verifying(state);
      None
    }
    // Other phases (including the platform's own "success") are
    // informational; only validated detections settle an attempt.
    ScanEvent::Phase { .. } => None,

    ScanEvent::Qr { text } if modality == Modality::Qr => {
      advance_to_verifying(state);
      let session = match store.active_session() {
        Some(session) => session,
        None => return Some(AttemptState::Failed(FailureReason::NoActiveSession)),
      };
      if !session.token.verify(&text, Utc::now()) {
        return Some(AttemptState::Failed(FailureReason::InvalidToken));
      }
      Some(commit(store, &session, subject, cancelled, VerificationMethod::Qr))
    }

    ScanEvent::Face { stable } if modality == Modality::Face => {
      advance_to_verifying(state);
      if stable != Some(true) {
        // Not stable yet: stay in Verifying until a stability signal or
        // the attempt times out.
        return None;
      }
      let session = match store.active_session() {
        Some(session) => session,
        None => return Some(AttemptState::Failed(FailureReason::NoActiveSession)),
      };
      Some(commit(
        store,
        &session,
        subject,
        cancelled,
        VerificationMethod::FaceRecognition,
      ))
    }

    // A detection for the wrong modality is untrusted garbage; ignore it.
    ScanEvent::Qr { .. } | ScanEvent::Face { .. } => None,
  }
}

/// A detection may arrive while the platform never reported a verifying
/// phase; the attempt is verifying from that point either way.
fn advance_to_verifying(state: &watch::Sender<AttemptState>) {
  if *state.borrow() == AttemptState::Scanning {
    let _ = state.send(AttemptState::Verifying);
  }
}

/// Write the single attendance record for a verified attempt.
fn commit(
  store: &AttendanceStore,
  session: &ActiveSession,
  subject: &ScanSubject,
  cancelled: &AtomicBool,
  method: VerificationMethod,
) -> AttemptState {
  // Last gate: a cancellation that raced the detection wins.
  if cancelled.load(Ordering::Acquire) {
    return AttemptState::Failed(FailureReason::Cancelled);
  }

  let mut input = NewAttendanceRecord::now(
    subject.student_id.clone(),
    session.course_id.clone(),
    session.course_name.clone(),
    AttendanceStatus::Present,
    method,
  );
  input.location = subject.location.clone();

  match store.mark_attendance(input) {
    Ok(record) => AttemptState::Success { record_id: record.record_id },
    Err(e) => {
      tracing::warn!(error = %e, "store rejected a verified attendance write");
      AttemptState::Failed(FailureReason::Rejected)
    }
  }
}
