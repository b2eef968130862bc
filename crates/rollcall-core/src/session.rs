//! Active-session and verification-token types.
//!
//! The token a student presents to prove presence is never a static string.
//! A session owns a random secret, and the QR payload shown to the class is
//! a windowed code derived from it with HMAC-SHA256 — the code rotates
//! every window and the whole token stops verifying at the configured
//! maximum lifetime, so a captured or shared payload cannot be replayed for
//! the rest of the session.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// ─── Token policy ────────────────────────────────────────────────────────────

/// Rotation and lifetime bounds for a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPolicy {
  /// Seconds per rotation window; the presented code changes every window.
  pub rotation_secs:     u32,
  /// Hard cap on how long any code derived from the token verifies.
  pub max_lifetime_secs: u32,
}

impl Default for TokenPolicy {
  fn default() -> Self {
    Self {
      rotation_secs:     30,
      max_lifetime_secs: 2 * 60 * 60,
    }
  }
}

// ─── Session token ───────────────────────────────────────────────────────────

/// The session-scoped verification secret plus its validity policy.
///
/// The secret itself never leaves the process; callers render and compare
/// windowed codes only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
  /// Hex-encoded 32-byte secret from the OS RNG.
  secret:        String,
  pub minted_at: DateTime<Utc>,
  pub policy:    TokenPolicy,
}

impl SessionToken {
  /// Length of the presented code, in decimal digits.
  pub const CODE_DIGITS: u32 = 8;

  /// Mint a fresh token under `policy`.
  pub fn mint(policy: TokenPolicy) -> Self {
    use rand_core::{OsRng, RngCore};
    let mut buf = [0u8; 32];
    OsRng.fill_bytes(&mut buf);
    Self {
      secret: hex::encode(buf),
      minted_at: Utc::now(),
      policy,
    }
  }

  /// The rotation-window index `now` falls in.
  fn window(&self, now: DateTime<Utc>) -> i64 {
    let rotation = i64::from(self.policy.rotation_secs.max(1));
    now.timestamp().div_euclid(rotation)
  }

  /// The code for a specific window: HMAC-SHA256 of the window index under
  /// the secret, dynamically truncated to [`Self::CODE_DIGITS`] digits.
  pub fn code_for_window(&self, window: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
      .expect("HMAC accepts keys of any length");
    mac.update(&window.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[31] & 0x0f) as usize;
    let val = u32::from_be_bytes([
      digest[offset],
      digest[offset + 1],
      digest[offset + 2],
      digest[offset + 3],
    ]) & 0x7fff_ffff;

    let num = val % 10u32.pow(Self::CODE_DIGITS);
    format!("{num:0width$}", width = Self::CODE_DIGITS as usize)
  }

  /// The code valid right now — what the lecturer-facing QR surface renders.
  pub fn current_code(&self, now: DateTime<Utc>) -> String {
    self.code_for_window(self.window(now))
  }

  /// Whether the token as a whole is past its maximum lifetime.
  pub fn expired(&self, now: DateTime<Utc>) -> bool {
    let age = now.signed_duration_since(self.minted_at);
    age.num_seconds() > i64::from(self.policy.max_lifetime_secs)
  }

  /// Check an untrusted presented payload. Accepts the current window's
  /// code or the immediately previous one (clock-skew grace); rejects
  /// everything else and anything after the maximum lifetime.
  pub fn verify(&self, presented: &str, now: DateTime<Utc>) -> bool {
    if self.expired(now) {
      return false;
    }
    let w = self.window(now);
    presented == self.code_for_window(w) || presented == self.code_for_window(w - 1)
  }
}

// ─── Active session ──────────────────────────────────────────────────────────

/// The single currently-open class session. At most one exists process-wide;
/// its existence in the store *is* the active flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSession {
  pub course_id:   String,
  pub course_name: String,
  pub started_at:  DateTime<Utc>,
  pub token:       SessionToken,
}
