//! Student — immutable roster reference data.
//!
//! Students are created and updated only by the external roster
//! collaborator; the store holds them purely so records can be attributed
//! and displayed without another lookup.

use serde::{Deserialize, Serialize};

/// One enrolled student. The `id` is the institution-issued student number
/// (e.g. `"20230001"`), not a store-generated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub id:         String,
  pub name:       String,
  pub email:      String,
  pub department: String,
  pub year:       u16,
}
