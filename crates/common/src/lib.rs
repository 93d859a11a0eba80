//! Shared types for the PMS console workspace
//!
//! `Secret` wraps tokens and passwords so they never reach logs, and `Error`
//! covers configuration loading for the binary.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
