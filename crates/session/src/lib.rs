//! Session state for the PMS backend
//!
//! Owns everything the gateway needs to know about "who is logged in":
//! the persisted credential bundle, the cached user profile, the wire types
//! of the auth endpoints, and the raw refresh-token call.
//!
//! Credential lifecycle:
//! 1. Login/registration response stored via `CredentialStore::set_token_pair()`
//!    and `CredentialStore::set_user()`
//! 2. Gateway reads `access_token()` and `user()` to decorate each request
//! 3. On an expiry signal the gateway calls `token::refresh_tokens()` directly
//!    on the transport (bypassing its own interception)
//! 4. New pair written back with `set_token_pair()`
//! 5. Logout or unrecoverable auth failure calls `clear_tokens()`

pub mod constants;
pub mod credentials;
pub mod error;
pub mod profile;
pub mod token;

pub use constants::*;
pub use credentials::{CredentialBundle, CredentialStore};
pub use error::{Error, RefreshError, Result};
pub use profile::UserProfile;
pub use token::{
    ApiEnvelope, LoginCredentials, RefreshResponse, RegisterCredentials, SessionGrant,
    refresh_tokens,
};
