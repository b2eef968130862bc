//! Session lifecycle and scan verification for Rollcall.
//!
//! This crate owns the two components that stand between untrusted input
//! and the attendance store: the session lifecycle (which mints the
//! rotating verification token) and the scan bridge (which turns
//! asynchronous platform scan events into validated attendance writes).

pub mod bridge;
pub mod capability;
pub mod error;
pub mod lifecycle;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
