//! Authenticated request gateway for the PMS backend
//!
//! The single entry point every caller uses to talk to the backend. Wraps a
//! `Transport` with:
//!
//! - Bearer-token and `userId` decoration from the credential store
//! - One-step classification of failures (`ApiFailure`)
//! - Transparent recovery from an expired access token: one refresh shared
//!   by all concurrent requests (`RefreshCoordinator`), each request replayed
//!   at most once
//! - Session teardown (credential wipe plus forced navigation) on
//!   unrecoverable auth failures, user notices for everything else
//!
//! ```text
//! caller ──► Gateway::send ──► decorate ──► Transport ──► classify
//!                 ▲                                          │
//!                 └──── replay ◄── refresh (single-flight) ◄─┘ expired
//! ```

mod auth;
pub mod classify;
pub mod coordinator;
pub mod decorate;
pub mod error;
mod gateway;
mod metrics;
pub mod notify;

#[cfg(test)]
mod testing;

pub use auth::{LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE, SessionSnapshot};
pub use classify::{
    ExpirySignal, GENERIC_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE, SESSION_EXPIRED_MESSAGE,
};
pub use coordinator::{RefreshCoordinator, RefreshOutcome};
pub use error::{ApiFailure, Error, FailureKind, Result};
pub use gateway::Gateway;
pub use notify::{Navigator, Notice, NoticeLevel, Notifier, TracingNavigator, TracingNotifier};
