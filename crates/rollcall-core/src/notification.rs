//! Transient system notifications and the bounded queue that holds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How urgently the message should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  Success,
  Warning,
  Error,
}

/// One transient operator/system message. Lives only inside
/// [`NotificationQueue`]; eviction is by capacity, never by age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub id:        Uuid,
  pub message:   String,
  pub severity:  Severity,
  pub timestamp: DateTime<Utc>,
}

/// Default number of surviving entries. A tunable constant, not derived.
pub const DEFAULT_CAPACITY: usize = 5;

// ─── Queue ───────────────────────────────────────────────────────────────────

/// Most-recent-first bounded buffer. Index 0 is always the newest surviving
/// notification; adding past capacity evicts the oldest.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
  entries:  Vec<Notification>,
  capacity: usize,
}

impl Default for NotificationQueue {
  fn default() -> Self {
    Self::new()
  }
}

impl NotificationQueue {
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_CAPACITY)
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      entries: Vec::new(),
      capacity,
    }
  }

  /// Assign an id and timestamp, prepend, and truncate to capacity.
  pub fn add(&mut self, message: impl Into<String>, severity: Severity) -> Notification {
    let notification = Notification {
      id:        Uuid::new_v4(),
      message:   message.into(),
      severity,
      timestamp: Utc::now(),
    };
    self.entries.insert(0, notification.clone());
    self.entries.truncate(self.capacity);
    notification
  }

  /// Remove by id; removing an absent id is a no-op. Returns whether an
  /// entry was removed.
  pub fn remove(&mut self, id: Uuid) -> bool {
    let before = self.entries.len();
    self.entries.retain(|n| n.id != id);
    self.entries.len() != before
  }

  pub fn entries(&self) -> &[Notification] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
