//! Backend auth routes and credential storage keys
//!
//! Storage keys match the names the web client used in browser local
//! storage, so a credential file is recognizable next to the old layout.

/// Login endpoint, relative to the API base URL
pub const LOGIN_PATH: &str = "/auth/login";

/// Registration endpoint
pub const REGISTER_PATH: &str = "/auth/register";

/// Refresh endpoint. Called straight on the transport, never intercepted.
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";

/// Unauthenticated entry point users are sent back to on forced logout
pub const ENTRY_PATH: &str = "/";

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const ID_TOKEN_KEY: &str = "idToken";
pub const USER_KEY: &str = "user";

/// Every key `CredentialStore::clear_tokens` removes.
pub const CREDENTIAL_KEYS: [&str; 4] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY, ID_TOKEN_KEY];
