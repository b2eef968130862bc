//! The advisory-notification producer.
//!
//! An explicit background task standing in for the campus announcement
//! feed: every tick it enqueues one advisory through the store's
//! serialised entry point. The queue's capacity bound means a slow reader
//! only ever sees the latest few.

use std::time::Duration;

use rand::Rng;
use rollcall_core::{notification::Severity, store::AttendanceStore};

const ADVISORIES: &[&str] = &[
  "New attendance policy update: GPS verification now required",
  "System maintenance scheduled for tonight 2:00 AM - 4:00 AM",
  "Face recognition accuracy improved to 99.2%",
  "New feature: Bulk attendance export now available",
  "Weather alert: Classes may be affected by heavy rainfall",
  "Library hours extended until 10 PM this week",
];

pub async fn run(store: AttendanceStore, every: Duration) {
  let mut ticker = tokio::time::interval(every);
  // Skip the immediate first tick so the queue starts empty.
  ticker.tick().await;

  loop {
    ticker.tick().await;

    let (message, severity) = {
      let mut rng = rand::thread_rng();
      let message = ADVISORIES[rng.gen_range(0..ADVISORIES.len())];
      let severity = if rng.gen_bool(0.3) {
        Severity::Warning
      } else {
        Severity::Info
      };
      (message, severity)
    };

    store.add_notification(message, severity);
    tracing::debug!(message, "advisory enqueued");
  }
}
