//! Console-specific error types

use thiserror::Error;

/// Failures the console reports with a dedicated exit code.
///
/// Backend failures are `gateway::Error`; these cover what happens around
/// them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("session ended, log in again with `pms-console login`")]
    SessionEnded,

    #[error("not logged in, run `pms-console login` first")]
    NotLoggedIn,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::SessionEnded | Error::NotLoggedIn => 2,
            Error::InvalidInput(_) => 64,
        }
    }
}
