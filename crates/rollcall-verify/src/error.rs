//! Error types for `rollcall-verify`.

use thiserror::Error;

use crate::capability::Modality;

#[derive(Debug, Error)]
pub enum Error {
  /// An attempt for this modality is already outstanding; callers cancel
  /// explicitly before starting another.
  #[error("a {0} attempt is already outstanding")]
  AttemptOutstanding(Modality),

  /// The platform capability refused to open a scan.
  #[error("scan capability error: {0}")]
  Capability(String),

  #[error(transparent)]
  Store(#[from] rollcall_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
