//! Tests for the scan bridge and the session lifecycle.

use std::{
  convert::Infallible,
  sync::{Arc, Mutex},
  time::Duration,
};

use chrono::Utc;
use tokio::sync::{mpsc, watch};

use rollcall_core::{
  record::VerificationMethod,
  session::TokenPolicy,
  store::AttendanceStore,
};

use crate::{
  bridge::{AttemptState, FailureReason, ScanBridge, ScanSubject},
  capability::{
    Modality, ScanCapability, ScanEvent, ScanOptions, ScanPhase, ScriptedScan,
  },
  error::Error,
  lifecycle::SessionLifecycle,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn subject() -> ScanSubject {
  ScanSubject {
    student_id: "20230001".into(),
    location:   Some("Room 205".into()),
  }
}

/// A capability the test drives by hand: it hands out the sender half of
/// each scan's event channel.
#[derive(Default)]
struct ManualScan {
  senders: Mutex<Vec<mpsc::Sender<ScanEvent>>>,
}

impl ManualScan {
  fn sender(&self) -> mpsc::Sender<ScanEvent> {
    self.senders.lock().unwrap().last().cloned().expect("no scan opened")
  }
}

impl ScanCapability for ManualScan {
  type Error = Infallible;

  async fn start_scan(
    &self,
    _modality: Modality,
    _options: ScanOptions,
  ) -> Result<mpsc::Receiver<ScanEvent>, Self::Error> {
    let (tx, rx) = mpsc::channel(8);
    self.senders.lock().unwrap().push(tx);
    Ok(rx)
  }

  async fn stop_scan(&self, _modality: Modality) -> Result<(), Self::Error> {
    Ok(())
  }
}

/// Wait for an attempt to reach a terminal state.
async fn settled(mut rx: watch::Receiver<AttemptState>) -> AttemptState {
  loop {
    let state = rx.borrow_and_update().clone();
    if state.is_terminal() {
      return state;
    }
    rx.changed().await.expect("driver dropped its state channel");
  }
}

/// A store with an active CS301 session; returns the currently valid code.
fn store_with_session() -> (AttendanceStore, SessionLifecycle, String) {
  let store = AttendanceStore::new();
  let lifecycle = SessionLifecycle::new(store.clone(), TokenPolicy::default());
  let session = lifecycle.start("CS301", "Data Structures").unwrap();
  let code = session.token.current_code(Utc::now());
  (store, lifecycle, code)
}

fn qr_script(code: &str) -> Vec<ScanEvent> {
  vec![
    ScanEvent::Phase { phase: ScanPhase::Scanning, progress: Some(0.2) },
    ScanEvent::Phase { phase: ScanPhase::Verifying, progress: Some(0.8) },
    ScanEvent::Qr { text: code.into() },
  ]
}

// Driver tasks are handed to `tokio::spawn`, so capability futures must be
// provably `Send`.
#[test]
fn capability_futures_are_send() {
  fn assert_send<T: Send>(_: T) {}
  let capability = ScriptedScan::new(Vec::new());
  assert_send(capability.start_scan(Modality::Qr, ScanOptions::default()));
  assert_send(capability.stop_scan(Modality::Qr));
}

// ─── QR verification ─────────────────────────────────────────────────────────

#[tokio::test]
async fn qr_success_commits_exactly_one_record() {
  let (store, _lifecycle, code) = store_with_session();
  let capability = Arc::new(ScriptedScan::new(qr_script(&code)));
  let bridge = ScanBridge::new(store.clone(), Arc::clone(&capability));

  let rx = bridge.start(Modality::Qr, subject()).await.unwrap();
  let outcome = settled(rx).await;

  let records = store.records();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].method, VerificationMethod::Qr);
  assert_eq!(records[0].course_id, "CS301");
  assert_eq!(records[0].student_id, "20230001");
  assert_eq!(records[0].location.as_deref(), Some("Room 205"));
  assert_eq!(
    outcome,
    AttemptState::Success { record_id: records[0].record_id },
  );

  // The platform side was torn down exactly once.
  assert_eq!(capability.stops(), vec![Modality::Qr]);
}

#[tokio::test]
async fn duplicate_detection_commits_once() {
  let (store, _lifecycle, code) = store_with_session();
  let capability = Arc::new(ScriptedScan::new(vec![
    ScanEvent::Qr { text: code.clone() },
    ScanEvent::Qr { text: code },
  ]));
  let bridge = ScanBridge::new(store.clone(), capability);

  let rx = bridge.start(Modality::Qr, subject()).await.unwrap();
  assert!(matches!(settled(rx).await, AttemptState::Success { .. }));
  assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn wrong_code_fails_with_invalid_token_and_no_record() {
  let (store, _lifecycle, _code) = store_with_session();
  let capability = Arc::new(ScriptedScan::new(qr_script("T2")));
  let bridge = ScanBridge::new(store.clone(), capability);

  let rx = bridge.start(Modality::Qr, subject()).await.unwrap();
  assert_eq!(
    settled(rx).await,
    AttemptState::Failed(FailureReason::InvalidToken),
  );
  assert!(store.records().is_empty());
}

#[tokio::test]
async fn detection_without_active_session_fails() {
  let store = AttendanceStore::new();
  let capability = Arc::new(ScriptedScan::new(qr_script("00000000")));
  let bridge = ScanBridge::new(store.clone(), capability);

  let rx = bridge.start(Modality::Qr, subject()).await.unwrap();
  assert_eq!(
    settled(rx).await,
    AttemptState::Failed(FailureReason::NoActiveSession),
  );
  assert!(store.records().is_empty());
}

#[tokio::test]
async fn session_end_invalidates_outstanding_codes() {
  let (store, lifecycle, code) = store_with_session();
  lifecycle.end();

  let bridge = ScanBridge::new(
    store.clone(),
    Arc::new(ScriptedScan::new(qr_script(&code))),
  );
  let rx = bridge.start(Modality::Qr, subject()).await.unwrap();
  assert_eq!(
    settled(rx).await,
    AttemptState::Failed(FailureReason::NoActiveSession),
  );
  assert!(store.records().is_empty());
}

// ─── Face verification ───────────────────────────────────────────────────────

#[tokio::test]
async fn face_commits_only_on_stability() {
  let (store, _lifecycle, _code) = store_with_session();
  let capability = Arc::new(ScriptedScan::new(vec![
    ScanEvent::Phase { phase: ScanPhase::Scanning, progress: None },
    ScanEvent::Face { stable: None },
    ScanEvent::Face { stable: Some(false) },
    ScanEvent::Face { stable: Some(true) },
  ]));
  let bridge = ScanBridge::new(store.clone(), capability);

  let rx = bridge.start(Modality::Face, subject()).await.unwrap();
  assert!(matches!(settled(rx).await, AttemptState::Success { .. }));

  let records = store.records();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].method, VerificationMethod::FaceRecognition);
}

#[tokio::test(start_paused = true)]
async fn face_never_stable_times_out() {
  let (store, _lifecycle, _code) = store_with_session();
  let capability = Arc::new(ManualScan::default());
  let bridge = ScanBridge::with_timeout(
    store.clone(),
    Arc::clone(&capability),
    Duration::from_secs(45),
  );

  let rx = bridge.start(Modality::Face, subject()).await.unwrap();
  let tx = capability.sender();
  tx.send(ScanEvent::Face { stable: Some(false) }).await.unwrap();

  assert_eq!(settled(rx).await, AttemptState::Failed(FailureReason::Timeout));
  assert!(store.records().is_empty());
}

// ─── Cancellation / exclusivity ──────────────────────────────────────────────

#[tokio::test]
async fn buffered_detection_after_stop_is_a_noop() {
  let (store, _lifecycle, code) = store_with_session();
  let capability = Arc::new(ManualScan::default());
  let bridge = ScanBridge::new(store.clone(), Arc::clone(&capability));

  let rx = bridge.start(Modality::Qr, subject()).await.unwrap();
  let tx = capability.sender();
  tx.send(ScanEvent::Phase { phase: ScanPhase::Scanning, progress: None })
    .await
    .unwrap();

  bridge.stop(Modality::Qr);

  // A perfectly valid detection delivered after stop must not commit.
  tx.send(ScanEvent::Qr { text: code }).await.unwrap();

  assert_eq!(settled(rx).await, AttemptState::Failed(FailureReason::Cancelled));
  assert!(store.records().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stalled_attempt_times_out() {
  let (store, _lifecycle, _code) = store_with_session();
  let capability = Arc::new(ManualScan::default());
  let bridge = ScanBridge::with_timeout(
    store.clone(),
    Arc::clone(&capability),
    Duration::from_secs(45),
  );

  let rx = bridge.start(Modality::Qr, subject()).await.unwrap();
  assert_eq!(settled(rx).await, AttemptState::Failed(FailureReason::Timeout));
}

#[tokio::test]
async fn second_start_requires_explicit_cancellation() {
  let (store, _lifecycle, _code) = store_with_session();
  let capability = Arc::new(ManualScan::default());
  let bridge = ScanBridge::new(store, Arc::clone(&capability));

  bridge.start(Modality::Qr, subject()).await.unwrap();
  let err = bridge.start(Modality::Qr, subject()).await.unwrap_err();
  assert!(matches!(err, Error::AttemptOutstanding(Modality::Qr)));

  // The other modality is unaffected by QR's outstanding attempt.
  bridge.start(Modality::Face, subject()).await.unwrap();

  // After an explicit stop the slot is immediately reusable.
  bridge.stop(Modality::Qr);
  bridge.start(Modality::Qr, subject()).await.unwrap();
}

#[tokio::test]
async fn start_rejects_empty_subject() {
  let (store, _lifecycle, _code) = store_with_session();
  let bridge = ScanBridge::new(store, Arc::new(ManualScan::default()));

  let err = bridge
    .start(Modality::Qr, ScanSubject { student_id: "  ".into(), location: None })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Store(rollcall_core::Error::EmptyField("student_id")),
  ));
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[test]
fn lifecycle_start_conflicts_then_supersedes() {
  let store = AttendanceStore::new();
  let lifecycle = SessionLifecycle::new(store.clone(), TokenPolicy::default());

  lifecycle.start("CS301", "Data Structures").unwrap();
  assert!(matches!(
    lifecycle.start("CS401", "Database Systems"),
    Err(Error::Store(rollcall_core::Error::SessionActive(_))),
  ));

  let session = lifecycle.start_superseding("CS401", "Database Systems").unwrap();
  assert_eq!(session.course_id, "CS401");
  assert_eq!(store.active_session().unwrap().course_id, "CS401");
}

#[test]
fn current_code_tracks_the_active_session() {
  let store = AttendanceStore::new();
  let lifecycle = SessionLifecycle::new(store.clone(), TokenPolicy::default());
  assert!(lifecycle.current_code().is_none());

  let session = lifecycle.start("CS301", "Data Structures").unwrap();
  let code = lifecycle.current_code().unwrap();
  assert!(session.token.verify(&code, Utc::now()));

  lifecycle.end();
  assert!(lifecycle.current_code().is_none());
}
