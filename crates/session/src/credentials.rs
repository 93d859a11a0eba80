//! Persistent credential storage
//!
//! A flat JSON object of string entries (access token, refresh token,
//! identity token, serialized user profile), the on-disk counterpart of the
//! web client's local storage. All writes use atomic temp-file + rename to
//! prevent corruption on crash. A tokio Mutex serializes concurrent writes
//! from request-time refresh and explicit login/logout.
//!
//! Getters and setters never fail. Once the store is loaded, a failed write
//! is logged and the in-memory state stays authoritative for the process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::{
    ACCESS_TOKEN_KEY, CREDENTIAL_KEYS, ID_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY,
};
use crate::error::{Error, Result};
use crate::profile::UserProfile;

type Entries = BTreeMap<String, String>;

/// Snapshot of every credential field at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialBundle {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub user: Option<UserProfile>,
}

impl CredentialBundle {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.id_token.is_none()
            && self.user.is_none()
    }
}

/// Thread-safe credential file manager.
///
/// `path` is `None` for an in-memory store (tests, `--ephemeral` runs).
pub struct CredentialStore {
    path: Option<PathBuf>,
    state: Mutex<Entries>,
}

impl CredentialStore {
    /// Load credentials from the given file path.
    ///
    /// A missing file is a cold start: the store begins empty and the file is
    /// created as `{}` so later loads take the normal path.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let entries: Entries = if contents.trim().is_empty() {
                Entries::new()
            } else {
                serde_json::from_str(&contents)
                    .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?
            };
            info!(path = %path.display(), entries = entries.len(), "loaded credentials");
            entries
        } else {
            info!(path = %path.display(), "credential file not found, starting signed out");
            let entries = Entries::new();
            write_atomic(&path, &entries).await?;
            entries
        };

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(Entries::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn set_access_token(&self, token: &str) {
        self.set(&[(ACCESS_TOKEN_KEY, token)]).await;
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY).await
    }

    pub async fn set_refresh_token(&self, token: &str) {
        self.set(&[(REFRESH_TOKEN_KEY, token)]).await;
    }

    pub async fn id_token(&self) -> Option<String> {
        self.get(ID_TOKEN_KEY).await
    }

    pub async fn set_id_token(&self, token: &str) {
        self.set(&[(ID_TOKEN_KEY, token)]).await;
    }

    /// Write access and refresh token in a single persisted update.
    pub async fn set_token_pair(&self, access: &str, refresh: &str) {
        self.set(&[(ACCESS_TOKEN_KEY, access), (REFRESH_TOKEN_KEY, refresh)])
            .await;
    }

    /// Cached profile, or `None` if absent or not decodable.
    pub async fn user(&self) -> Option<UserProfile> {
        let raw = self.get(USER_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, "stored user profile is malformed, ignoring");
                None
            }
        }
    }

    pub async fn set_user(&self, profile: &UserProfile) {
        match serde_json::to_string(profile) {
            Ok(json) => self.set(&[(USER_KEY, &json)]).await,
            Err(e) => warn!(error = %e, "failed to serialize user profile, not stored"),
        }
    }

    /// Remove access, refresh, user and identity entries in one update.
    ///
    /// Safe to call on an already empty store.
    pub async fn clear_tokens(&self) {
        let mut state = self.state.lock().await;
        let before = state.len();
        for key in CREDENTIAL_KEYS {
            state.remove(key);
        }
        if state.len() != before {
            debug!(removed = before - state.len(), "cleared credentials");
            self.persist(&state).await;
        }
    }

    pub async fn bundle(&self) -> CredentialBundle {
        CredentialBundle {
            access_token: self.access_token().await,
            refresh_token: self.refresh_token().await,
            id_token: self.id_token().await,
            user: self.user().await,
        }
    }

    /// Read one entry. Empty strings count as absent.
    async fn get(&self, key: &str) -> Option<String> {
        let state = self.state.lock().await;
        state.get(key).filter(|v| !v.is_empty()).cloned()
    }

    async fn set(&self, entries: &[(&str, &str)]) {
        let mut state = self.state.lock().await;
        for (key, value) in entries {
            state.insert((*key).to_string(), (*value).to_string());
        }
        self.persist(&state).await;
    }

    async fn persist(&self, state: &Entries) {
        if let Some(path) = &self.path
            && let Err(e) = write_atomic(path, state).await
        {
            warn!(path = %path.display(), error = %e, "failed to persist credentials");
        }
    }
}

/// Write credentials to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets file permissions to 0600 (owner read/write only) since
/// the file contains bearer tokens.
async fn write_atomic(path: &Path, data: &Entries) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::CredentialParse(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;
    if !dir.as_os_str().is_empty() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::Io(format!("creating credential directory: {e}")))?;
    }

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn signed_in(store: &CredentialStore) {
        store.set_token_pair("at_1", "rt_1").await;
        store.set_id_token("id_1").await;
        store.set_user(&UserProfile::with_id(7)).await;
    }

    #[tokio::test]
    async fn roundtrip_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::load(path.clone()).await.unwrap();
        signed_in(&store).await;

        let reloaded = CredentialStore::load(path).await.unwrap();
        assert_eq!(reloaded.access_token().await.as_deref(), Some("at_1"));
        assert_eq!(reloaded.refresh_token().await.as_deref(), Some("rt_1"));
        assert_eq!(reloaded.id_token().await.as_deref(), Some("id_1"));
        assert_eq!(reloaded.user().await.unwrap().user_id(), Some(7));
    }

    #[tokio::test]
    async fn file_layout_uses_well_known_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::load(path.clone()).await.unwrap();
        signed_in(&store).await;

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        let keys: Vec<&str> = raw.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["accessToken", "idToken", "refreshToken", "user"]);
        // The profile is stored as a JSON string, not a nested object
        let user: serde_json::Value = serde_json::from_str(&raw["user"]).unwrap();
        assert_eq!(user["id"], 7);
    }

    #[tokio::test]
    async fn cold_start_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        assert!(!path.exists());
        let store = CredentialStore::load(path.clone()).await.unwrap();
        assert!(store.bundle().await.is_empty());
        assert!(path.exists());

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&contents).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let result = CredentialStore::load(path).await;
        assert!(matches!(result, Err(Error::CredentialParse(_))));
    }

    #[tokio::test]
    async fn malformed_user_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        tokio::fs::write(&path, r#"{"accessToken":"at_1","user":"{broken"}"#)
            .await
            .unwrap();

        let store = CredentialStore::load(path).await.unwrap();
        assert!(store.user().await.is_none());
        assert_eq!(store.access_token().await.as_deref(), Some("at_1"));
    }

    #[tokio::test]
    async fn empty_values_read_as_absent() {
        let store = CredentialStore::in_memory();
        store.set_access_token("").await;
        assert!(store.access_token().await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_all_four_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::load(path.clone()).await.unwrap();
        signed_in(&store).await;
        store.clear_tokens().await;

        assert!(store.bundle().await.is_empty());
        let reloaded = CredentialStore::load(path).await.unwrap();
        assert!(reloaded.bundle().await.is_empty());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = CredentialStore::in_memory();
        signed_in(&store).await;

        store.clear_tokens().await;
        let first = store.bundle().await;
        store.clear_tokens().await;
        let second = store.bundle().await;

        assert!(first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn token_pair_is_written_together() {
        let store = CredentialStore::in_memory();
        store.set_token_pair("at_2", "rt_2").await;
        let bundle = store.bundle().await;
        assert_eq!(bundle.access_token.as_deref(), Some("at_2"));
        assert_eq!(bundle.refresh_token.as_deref(), Some("rt_2"));
    }

    #[tokio::test]
    async fn in_memory_has_no_path() {
        let store = CredentialStore::in_memory();
        assert!(store.path().is_none());
        store.set_access_token("at_x").await;
        assert_eq!(store.access_token().await.as_deref(), Some("at_x"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::load(path.clone()).await.unwrap();
        signed_in(&store).await;

        let metadata = tokio::fs::metadata(&path).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "credential file must be 0600, got {mode:o}");
    }

    #[tokio::test]
    async fn concurrent_writes_dont_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = Arc::new(CredentialStore::load(path.clone()).await.unwrap());

        let mut handles = vec![];
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .set_token_pair(&format!("at_{i}"), &format!("rt_{i}"))
                    .await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Whichever write landed last, the pair must still match
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&contents).unwrap();
        let access = parsed["accessToken"].trim_start_matches("at_");
        let refresh = parsed["refreshToken"].trim_start_matches("rt_");
        assert_eq!(access, refresh);
    }
}
