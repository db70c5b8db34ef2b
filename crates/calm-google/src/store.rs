//! The on-disk credential store.
//!
//! All persisted state lives in one fixed directory (`~/.calm/` by default):
//! `credentials.json`, the OAuth client document the user downloaded from the
//! Google Cloud Console, and `token.json`, the session token this tool
//! manages. The store is constructed over an explicit directory so tests can
//! point it anywhere, and token state is passed in and out by value; nothing
//! is cached process-wide.
//!
//! # File handling
//!
//! Both documents are written with mode `0600` on Unix. Token writes go
//! through a temp file and rename so a crash never leaves a torn file. A
//! token file that exists but does not parse is treated as absent: the next
//! query re-runs consent instead of failing.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::credentials::OAuthCredentials;
use crate::error::{GoogleError, GoogleResult};
use crate::tokens::StoredToken;

/// Name of the user-provided OAuth client document.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Name of the tool-managed session token document.
pub const TOKEN_FILE: &str = "token.json";

/// Reads and writes the two persisted documents under one directory.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    /// Opens the default store at `~/.calm/`.
    pub fn open_default() -> Self {
        let dir = dirs::home_dir()
            .map(|home| home.join(".calm"))
            .unwrap_or_else(|| PathBuf::from(".calm"));
        Self::at(dir)
    }

    /// Opens a store over an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the OAuth client document.
    pub fn credentials_path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }

    /// Returns the path of the session token document.
    pub fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    /// Returns true if an OAuth client document has been imported.
    pub fn has_credentials(&self) -> bool {
        self.credentials_path().exists()
    }

    /// Loads the OAuth client document.
    ///
    /// # Errors
    ///
    /// A missing or unparseable document is a configuration error: the user
    /// must download the client from the Google Cloud Console and import it
    /// with `calm configure oauth`.
    pub fn load_credentials(&self) -> GoogleResult<OAuthCredentials> {
        let path = self.credentials_path();
        if !path.exists() {
            return Err(GoogleError::configuration(format!(
                "no OAuth client at {}; download one from the Google Cloud Console \
                 and run `calm configure oauth --path <file>`",
                path.display()
            )));
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            GoogleError::configuration(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))
        })?;
        let credentials = OAuthCredentials::from_json(&content)?;
        credentials.validate()?;
        Ok(credentials)
    }

    /// Validates and writes an OAuth client document.
    pub fn import_credentials(&self, json: &str) -> GoogleResult<()> {
        let credentials = OAuthCredentials::from_json(json)?;
        credentials.validate()?;
        self.write_secure(&self.credentials_path(), json)?;
        info!("imported OAuth client to {:?}", self.credentials_path());
        Ok(())
    }

    /// Loads the session token, if one is usable.
    ///
    /// Returns `Ok(None)` when the file is missing, and also when it exists
    /// but cannot be parsed: a corrupt token is treated as absent so the next
    /// query re-authenticates instead of crashing.
    pub fn load_token(&self) -> GoogleResult<Option<StoredToken>> {
        let path = self.token_path();
        if !path.exists() {
            debug!("no token file at {:?}", path);
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            GoogleError::configuration(format!("failed to read token file: {}", e))
        })?;

        match serde_json::from_str::<StoredToken>(&content) {
            Ok(token) => {
                debug!("loaded token from {:?}", path);
                Ok(Some(token))
            }
            Err(e) => {
                warn!("ignoring unparseable token file {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    /// Persists the session token.
    ///
    /// The previous token, if any, is overwritten whole; tokens are never
    /// merged.
    pub fn save_token(&self, token: &StoredToken) -> GoogleResult<()> {
        let content = serde_json::to_string_pretty(token)
            .map_err(|e| GoogleError::internal(format!("failed to serialize token: {}", e)))?;
        self.write_secure(&self.token_path(), &content)?;
        debug!("saved token to {:?}", self.token_path());
        Ok(())
    }

    /// Deletes the session token, forcing re-authorization on the next query.
    pub fn clear_token(&self) -> GoogleResult<()> {
        let path = self.token_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                GoogleError::configuration(format!("failed to remove token file: {}", e))
            })?;
            info!("cleared token at {:?}", path);
        }
        Ok(())
    }

    /// Deletes both the session token and the OAuth client document.
    pub fn clear_all(&self) -> GoogleResult<()> {
        self.clear_token()?;
        let path = self.credentials_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                GoogleError::configuration(format!("failed to remove credentials file: {}", e))
            })?;
            info!("cleared OAuth client at {:?}", path);
        }
        Ok(())
    }

    /// Writes a document via temp file + rename, with mode `0600` on Unix.
    fn write_secure(&self, path: &Path, content: &str) -> GoogleResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GoogleError::configuration(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| {
            GoogleError::configuration(format!("failed to write {}: {}", path.display(), e))
        })?;
        fs::rename(&temp_path, path).map_err(|e| {
            GoogleError::configuration(format!("failed to rename {}: {}", path.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(path, perms);
        }

        Ok(())
    }
}
