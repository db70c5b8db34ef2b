//! The session token document.
//!
//! [`StoredToken`] is what `token.json` holds: the access/refresh token pair
//! from a completed consent flow plus enough metadata to decide whether a
//! silent refresh is due. Persistence lives in [`crate::store`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An OAuth token set as persisted between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    /// The access token for API requests.
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,

    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// The OAuth scopes that were granted.
    pub scopes: Vec<String>,

    /// When the tokens were last refreshed.
    pub last_refresh: DateTime<Utc>,
}

impl StoredToken {
    /// Creates a token set from OAuth response data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            // No expiry recorded: assume still valid.
            None => false,
        }
    }

    /// Returns true if the token was granted all the required scopes.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Replaces the access token after a refresh, keeping the refresh token.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(expiry_from_now);
        self.last_refresh = Utc::now();
    }
}

/// Converts a lifetime in seconds to an absolute expiry instant.
///
/// A 60-second buffer is subtracted so refresh happens before the token
/// actually lapses mid-request.
fn expiry_from_now(secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(secs) - Duration::seconds(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation() {
        let token = StoredToken::new(
            "access-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec!["scope1".to_string()],
        );

        assert_eq!(token.access_token, "access-token");
        assert_eq!(token.refresh_token, Some("refresh-token".to_string()));
        assert!(token.expires_at.is_some());
        assert!(!token.is_expired());
    }

    #[test]
    fn expiry() {
        let mut token = StoredToken::new("access", None, Some(3600), vec![]);
        token.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(token.is_expired());

        // No expiry recorded is treated as valid.
        let token = StoredToken::new("access", None, None, vec![]);
        assert!(!token.is_expired());
    }

    #[test]
    fn scope_check() {
        let token = StoredToken::new(
            "access",
            None,
            None,
            vec!["scope1".to_string(), "scope2".to_string()],
        );

        assert!(token.has_scopes(&["scope1".to_string()]));
        assert!(token.has_scopes(&["scope1".to_string(), "scope2".to_string()]));
        assert!(!token.has_scopes(&["scope3".to_string()]));
    }

    #[test]
    fn refresh_keeps_refresh_token() {
        let mut token = StoredToken::new(
            "old-access",
            Some("refresh-token".to_string()),
            Some(10),
            vec![],
        );
        token.update_access_token("new-access", Some(3600));

        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token, Some("refresh-token".to_string()));
        assert!(!token.is_expired());
    }

    #[test]
    fn serde_roundtrip() {
        let token = StoredToken::new(
            "access",
            Some("refresh".to_string()),
            Some(3600),
            vec!["scope".to_string()],
        );
        let json = serde_json::to_string(&token).unwrap();
        let parsed: StoredToken = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.access_token, token.access_token);
        assert_eq!(parsed.expires_at, token.expires_at);
    }
}
