//! Core types and the attendance state store for Rollcall.
//!
//! This crate is deliberately free of HTTP and platform-capability
//! dependencies. All other crates depend on it; it depends on nothing that
//! blocks or does I/O beyond the OS random-number generator.

pub mod error;
pub mod notification;
pub mod record;
pub mod session;
pub mod store;
pub mod student;


pub use error::{Error, Result};
