//! `--demo` — one scripted QR verification against a fresh session.
//!
//! Exercises the full path at startup: open a session, play a scan script
//! through the bridge, and log the outcome. Useful for smoke-testing a
//! deployment without a camera attached.

use std::{sync::Arc, time::Duration};

use rollcall_core::store::AttendanceStore;
use rollcall_verify::{
  bridge::{AttemptState, ScanBridge, ScanSubject},
  capability::{Modality, ScanEvent, ScanPhase, ScriptedScan},
  lifecycle::SessionLifecycle,
};

pub async fn run(
  store: AttendanceStore,
  lifecycle: Arc<SessionLifecycle>,
  scan_timeout: Duration,
) {
  let session = match lifecycle.start_superseding("CS301", "Data Structures") {
    Ok(session) => session,
    Err(e) => {
      tracing::error!(error = %e, "demo could not open a session");
      return;
    }
  };

  let Some(code) = lifecycle.current_code() else {
    tracing::error!("demo session has no presentable code");
    return;
  };

  let capability = Arc::new(ScriptedScan::new(vec![
    ScanEvent::Phase {
      phase:    ScanPhase::Scanning,
      progress: Some(0.4),
    },
    ScanEvent::Phase {
      phase:    ScanPhase::Verifying,
      progress: Some(0.9),
    },
    ScanEvent::Qr { text: code },
  ]));

  let bridge = ScanBridge::with_timeout(store, capability, scan_timeout);
  let subject = ScanSubject {
    student_id: "20230001".to_string(),
    location:   Some("Room 205".to_string()),
  };

  let mut state = match bridge.start(Modality::Qr, subject).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "demo scan failed to start");
      return;
    }
  };

  loop {
    let current = state.borrow_and_update().clone();
    match current {
      AttemptState::Success { record_id } => {
        tracing::info!(
          %record_id,
          course_id = %session.course_id,
          "demo verification recorded attendance",
        );
        return;
      }
      AttemptState::Failed(reason) => {
        tracing::warn!(reason = reason.code(), "demo verification failed");
        return;
      }
      _ => {
        if state.changed().await.is_err() {
          tracing::warn!("demo attempt ended without a terminal state");
          return;
        }
      }
    }
  }
}
