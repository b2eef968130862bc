//! Error types for `rollcall-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  /// A caller passed an empty value for a field the store requires.
  #[error("required field is empty: {0}")]
  EmptyField(&'static str),

  /// A session is already active; callers must end it or supersede
  /// explicitly. The payload names the course the active session belongs to.
  #[error("a session for course {0} is already active")]
  SessionActive(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
