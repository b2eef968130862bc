//! The platform scan-capability boundary.
//!
//! The camera-based scanner lives outside this core and is only partially
//! trusted: it delivers phase and detection events over a channel, and any
//! payload must be validated before it can touch persistent state. The
//! channel handed out by [`ScanCapability::start_scan`] is the listener
//! registration — the attempt that owns it drops it on cancellation, so a
//! superseded or aborted attempt can never leak a subscription.

use std::{
  fmt,
  future::Future,
  sync::{Mutex, PoisonError},
};

use tokio::sync::mpsc;

// ─── Modality ────────────────────────────────────────────────────────────────

/// A camera-driven verification method. GPS and manual marking carry no
/// platform state machine and enter the store directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
  Qr,
  Face,
}

impl fmt::Display for Modality {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Qr => write!(f, "qr"),
      Self::Face => write!(f, "face"),
    }
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// A scan phase as reported by the platform. Anything unrecognised arrives
/// as [`ScanPhase::Other`] and is informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPhase {
  Scanning,
  Verifying,
  Success,
  Other(String),
}

/// An inbound event from the platform capability. All payloads are
/// untrusted.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
  /// Progress/phase report for the running scan.
  Phase {
    phase:    ScanPhase,
    progress: Option<f32>,
  },
  /// A decoded QR payload.
  Qr { text: String },
  /// A face-framing report; `stable` must be `Some(true)` to accept.
  Face { stable: Option<bool> },
}

/// Options passed through to the platform when opening a scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
  /// Face verification wants the selfie camera; QR wants the rear one.
  pub prefer_front_camera: bool,
}

impl ScanOptions {
  pub fn for_modality(modality: Modality) -> Self {
    Self {
      prefer_front_camera: matches!(modality, Modality::Face),
    }
  }
}

// ─── Capability trait ────────────────────────────────────────────────────────

/// Abstraction over the platform scanner.
///
/// `start_scan` opens a scan and returns the event channel for it;
/// `stop_scan` tears the platform side down. Implementations must tolerate
/// `stop_scan` for a modality that is not scanning.
///
/// All methods return `Send` futures so attempt driver tasks can be spawned
/// on a multi-threaded runtime.
pub trait ScanCapability: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  fn start_scan(
    &self,
    modality: Modality,
    options: ScanOptions,
  ) -> impl Future<Output = Result<mpsc::Receiver<ScanEvent>, Self::Error>> + Send + '_;

  fn stop_scan(
    &self,
    modality: Modality,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Scripted capability ─────────────────────────────────────────────────────

/// A capability that plays back a fixed event sequence. Used by tests and
/// the server's demo mode in place of a real camera.
pub struct ScriptedScan {
  script: Mutex<Vec<ScanEvent>>,
  stops:  Mutex<Vec<Modality>>,
}

impl ScriptedScan {
  pub fn new(script: Vec<ScanEvent>) -> Self {
    Self {
      script: Mutex::new(script),
      stops:  Mutex::new(Vec::new()),
    }
  }

  fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The `stop_scan` calls observed so far.
  pub fn stops(&self) -> Vec<Modality> {
    Self::lock(&self.stops).clone()
  }
}

impl ScanCapability for ScriptedScan {
  type Error = std::convert::Infallible;

  async fn start_scan(
    &self,
    _modality: Modality,
    _options: ScanOptions,
  ) -> Result<mpsc::Receiver<ScanEvent>, Self::Error> {
    let script = std::mem::take(&mut *Self::lock(&self.script));
    let (tx, rx) = mpsc::channel(script.len().max(1));
    for event in script {
      // Capacity matches the script, so this cannot fail.
      let _ = tx.try_send(event);
    }
    Ok(rx)
  }

  async fn stop_scan(&self, modality: Modality) -> Result<(), Self::Error> {
    Self::lock(&self.stops).push(modality);
    Ok(())
  }
}
