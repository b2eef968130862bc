//! Actor attribution from the external identity collaborator.
//!
//! This core never manages credentials. The identity provider in front of
//! the API authenticates the caller and stamps `X-Actor-Id` and
//! `X-Actor-Role` on the forwarded request; the [`Actor`] extractor turns
//! those into a typed identity and rejects requests without one.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};

use crate::{AppState, error::ApiError};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The caller's role as asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Student,
  Lecturer,
  Admin,
}

impl Role {
  fn parse(s: &str) -> Option<Self> {
    match s {
      "student" => Some(Self::Student),
      "lecturer" => Some(Self::Lecturer),
      "admin" => Some(Self::Admin),
      _ => None,
    }
  }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Actor {
  pub id:   String,
  pub role: Role,
}

impl Actor {
  /// Staff operations: scoring records and controlling sessions.
  pub fn is_staff(&self) -> bool {
    matches!(self.role, Role::Lecturer | Role::Admin)
  }
}

/// Read an actor directly from headers — used by handlers outside the
/// extractor path.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
  let id = headers
    .get(ACTOR_ID_HEADER)
    .and_then(|v| v.to_str().ok())
    .filter(|v| !v.trim().is_empty())
    .ok_or(ApiError::Unauthorized)?;

  let role = headers
    .get(ACTOR_ROLE_HEADER)
    .and_then(|v| v.to_str().ok())
    .and_then(Role::parse)
    .ok_or(ApiError::Unauthorized)?;

  Ok(Actor { id: id.to_owned(), role })
}

impl FromRequestParts<AppState> for Actor {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &AppState,
  ) -> Result<Self, Self::Rejection> {
    actor_from_headers(&parts.headers)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn headers(id: Option<&str>, role: Option<&str>) -> HeaderMap {
    let mut h = HeaderMap::new();
    if let Some(id) = id {
      h.insert(ACTOR_ID_HEADER, HeaderValue::from_str(id).unwrap());
    }
    if let Some(role) = role {
      h.insert(ACTOR_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
    }
    h
  }

  #[test]
  fn valid_headers() {
    let actor = actor_from_headers(&headers(Some("u-1"), Some("lecturer"))).unwrap();
    assert_eq!(actor.id, "u-1");
    assert_eq!(actor.role, Role::Lecturer);
    assert!(actor.is_staff());
  }

  #[test]
  fn students_are_not_staff() {
    let actor = actor_from_headers(&headers(Some("20230001"), Some("student"))).unwrap();
    assert!(!actor.is_staff());
  }

  #[test]
  fn missing_or_unknown_headers_reject() {
    assert!(matches!(
      actor_from_headers(&headers(None, Some("student"))),
      Err(ApiError::Unauthorized),
    ));
    assert!(matches!(
      actor_from_headers(&headers(Some("u-1"), None)),
      Err(ApiError::Unauthorized),
    ));
    assert!(matches!(
      actor_from_headers(&headers(Some("u-1"), Some("superuser"))),
      Err(ApiError::Unauthorized),
    ));
  }
}
