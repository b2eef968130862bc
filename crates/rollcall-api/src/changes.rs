//! `/changes` — the long-poll change feed for read-surface observers.
//!
//! Observers pass the last revision they rendered; the handler parks on
//! the store's watch channel until the revision moves past it (or a bounded
//! wait elapses), then returns the current revision. Observers re-read the
//! snapshot endpoints they care about.

use std::time::Duration;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, identity::Actor};

/// Upper bound on how long one poll may park.
const POLL_WINDOW: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct ChangeParams {
  /// The last revision the observer has seen. Omitted means "tell me the
  /// current one immediately".
  pub since: Option<u64>,
}

/// `GET /changes[?since=N]`
pub async fn poll(
  State(state): State<AppState>,
  _actor: Actor,
  Query(params): Query<ChangeParams>,
) -> Json<Value> {
  let mut rx = state.store.subscribe();

  let revision = match params.since {
    None => *rx.borrow(),
    Some(since) => {
      let wait = rx.wait_for(|rev| *rev > since);
      match tokio::time::timeout(POLL_WINDOW, wait).await {
        Ok(Ok(rev)) => *rev,
        // Sender dropped or window elapsed: report where we are.
        _ => state.store.revision(),
      }
    }
  };

  Json(json!({ "revision": revision }))
}
