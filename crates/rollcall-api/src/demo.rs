//! `/demo/records` — the synthetic paginated record generator.
//!
//! Display-only scaffolding for dashboards and pagination demos. The types
//! here are deliberately distinct from the core record types so the demo
//! feed can never be mistaken for the authoritative attendance log.

use std::sync::LazyLock;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{Duration, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{AppState, identity::Actor};

const TOTAL_RECORDS: usize = 50;
const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 50;

const STUDENTS: &[&str] = &[
  "Kwame Asante",
  "Ama Osei",
  "Kojo Mensah",
  "Akosua Adjei",
  "Yaw Boateng",
  "Efua Darko",
  "Kofi Appiah",
  "Abena Sarpong",
  "Kwaku Owusu",
  "Adwoa Bekoe",
];

const METHODS: &[&str] = &["QR Code", "Face Recognition", "GPS"];

// ─── Types ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoStatus {
  Verified,
  Pending,
}

/// One synthetic row. Not a [`rollcall_core::record::AttendanceRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct DemoRecord {
  pub id:           u32,
  pub student_name: String,
  pub student_id:   String,
  pub method:       String,
  pub time:         String,
  pub status:       DemoStatus,
  pub confidence:   Option<String>,
}

// Seeded so every run (and every page re-fetch) sees the same data.
static RECORDS: LazyLock<Vec<DemoRecord>> = LazyLock::new(|| {
  let mut rng = StdRng::seed_from_u64(0x20230001);
  let now = Utc::now();

  (1..=TOTAL_RECORDS as u32)
    .map(|id| {
      let minutes_ago = rng.gen_range(0..60);
      DemoRecord {
        id,
        student_name: (*STUDENTS.choose(&mut rng).unwrap_or(&STUDENTS[0])).to_owned(),
        student_id:   format!("20230{:03}", rng.gen_range(0..999)),
        method:       (*METHODS.choose(&mut rng).unwrap_or(&METHODS[0])).to_owned(),
        time:         (now - Duration::minutes(minutes_ago)).format("%H:%M:%S").to_string(),
        status:       if rng.gen_bool(0.9) { DemoStatus::Verified } else { DemoStatus::Pending },
        confidence:   rng
          .gen_bool(0.5)
          .then(|| format!("{:.1}%", 85.0 + rng.gen_range(0.0..15.0))),
      }
    })
    .collect()
});

// ─── Handler ──────────────────────────────────────────────────────────────────

fn default_page() -> usize {
  1
}

fn default_page_size() -> usize {
  DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
  #[serde(default = "default_page")]
  pub page:      usize,
  #[serde(default = "default_page_size")]
  pub page_size: usize,
}

#[derive(Debug, Serialize)]
pub struct PageView {
  pub records: Vec<DemoRecord>,
  pub total:   usize,
}

/// `GET /demo/records?page=1&page_size=10`
pub async fn list(
  State(_state): State<AppState>,
  _actor: Actor,
  Query(params): Query<PageParams>,
) -> Json<PageView> {
  let page = params.page.max(1);
  let page_size = params.page_size.clamp(1, MAX_PAGE_SIZE);

  let start = (page - 1).saturating_mul(page_size).min(RECORDS.len());
  let end = start.saturating_add(page_size).min(RECORDS.len());

  Json(PageView {
    records: RECORDS[start..end].to_vec(),
    total:   RECORDS.len(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generator_is_bounded_and_roster_shaped() {
    assert_eq!(RECORDS.len(), TOTAL_RECORDS);
    assert!(RECORDS.iter().all(|r| r.student_id.starts_with("20230")));
    assert!(RECORDS.iter().all(|r| STUDENTS.contains(&r.student_name.as_str())));
    // Confidence is only ever attached to rows that carry one.
    assert!(
      RECORDS
        .iter()
        .filter_map(|r| r.confidence.as_deref())
        .all(|c| c.ends_with('%'))
    );
  }

  #[test]
  fn pagination_slices_without_overrun() {
    let start = 45.min(RECORDS.len());
    let end = 55usize.min(RECORDS.len());
    assert_eq!(RECORDS[start..end].len(), 5);
  }
}
