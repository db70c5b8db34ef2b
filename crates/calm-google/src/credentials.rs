//! OAuth client credentials.
//!
//! Users bring their own OAuth client, downloaded from the Google Cloud
//! Console: Google requires a registered application for API access. The
//! downloaded JSON lands in the credential store as `credentials.json` and is
//! parsed here.

use serde::Deserialize;

use crate::error::{GoogleError, GoogleResult};

/// OAuth 2.0 client identity for Google API access.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from the Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from the Google Cloud Console.
    pub client_secret: String,
}

/// Structure of Google's OAuth client JSON document.
///
/// Supports the Cloud Console download format with an "installed" or "web"
/// section, and the flat format (client_id/client_secret at the root) that
/// gcloud and similar tools emit.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    /// Credentials for installed (desktop) applications.
    installed: Option<NestedCredentials>,
    /// Credentials for web applications.
    web: Option<NestedCredentials>,
    /// Direct client_id (flat format).
    client_id: Option<String>,
    /// Direct client_secret (flat format).
    client_secret: Option<String>,
}

/// OAuth credentials within a nested section of the client document.
#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    /// Creates credentials from raw parts.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Parses an OAuth client JSON document.
    ///
    /// Accepts `{"installed": {...}}`, `{"web": {...}}`, or a flat
    /// `{"client_id": ..., "client_secret": ...}` object.
    pub fn from_json(json: &str) -> GoogleResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            GoogleError::configuration(format!("failed to parse OAuth client JSON: {}", e))
        })?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err(GoogleError::configuration(
            "OAuth client JSON must contain an 'installed'/'web' section \
             or 'client_id'/'client_secret' at the root",
        ))
    }

    /// Validates that the credentials look like a Google OAuth client.
    ///
    /// Checks that the client ID ends with `.apps.googleusercontent.com` and
    /// that the secret is non-empty.
    pub fn validate(&self) -> GoogleResult<()> {
        if self.client_id.is_empty() {
            return Err(GoogleError::configuration("client_id is required"));
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err(GoogleError::configuration(
                "client_id should end with .apps.googleusercontent.com",
            ));
        }
        if self.client_secret.is_empty() {
            return Err(GoogleError::configuration("client_secret is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GoogleErrorCode;

    #[test]
    fn from_json_installed() {
        let json = r#"{
            "installed": {
                "client_id": "test-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "project_id": "my-project"
            }
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn from_json_web() {
        let json = r#"{
            "web": {
                "client_id": "web-id.apps.googleusercontent.com",
                "client_secret": "web-secret"
            }
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "web-id.apps.googleusercontent.com");
    }

    #[test]
    fn from_json_flat() {
        // Format used by gcloud and other tools.
        let json = r#"{
            "client_id": "flat-id.apps.googleusercontent.com",
            "client_secret": "flat-secret",
            "refresh_token": "some-refresh-token"
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_secret, "flat-secret");
    }

    #[test]
    fn from_json_missing_sections() {
        let err = OAuthCredentials::from_json(r#"{ "other": {} }"#).unwrap_err();
        assert_eq!(err.code(), GoogleErrorCode::Configuration);
        assert!(err.message().contains("client_id"));
    }

    #[test]
    fn from_json_malformed() {
        let err = OAuthCredentials::from_json("not json").unwrap_err();
        assert_eq!(err.code(), GoogleErrorCode::Configuration);
        assert!(err.message().contains("parse"));
    }

    #[test]
    fn validation() {
        let valid = OAuthCredentials::new("test.apps.googleusercontent.com", "secret");
        assert!(valid.validate().is_ok());

        let empty_id = OAuthCredentials::new("", "secret");
        assert!(empty_id.validate().is_err());

        let bad_suffix = OAuthCredentials::new("bad-id", "secret");
        assert!(bad_suffix.validate().is_err());

        let empty_secret = OAuthCredentials::new("test.apps.googleusercontent.com", "");
        assert!(empty_secret.validate().is_err());
    }
}
