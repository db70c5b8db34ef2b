//! Token lifecycle: one entry point that always yields a usable access token.
//!
//! [`Authenticator::ensure_authenticated`] tries the cheapest route first:
//! the stored token as-is, then a silent refresh, then a full consent round
//! through the supplied [`ConsentBroker`]. The store is written only after a
//! route succeeds, so a failed or abandoned attempt leaves whatever was
//! there before.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::consent::ConsentBroker;
use crate::credentials::OAuthCredentials;
use crate::error::{GoogleErrorCode, GoogleResult};
use crate::oauth::OAuthClient;
use crate::store::CredentialStore;
use crate::tokens::StoredToken;

/// Scope granting access to the user's calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Default timeout for token endpoint requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives the stored-token / refresh / consent decision.
pub struct Authenticator {
    store: CredentialStore,
    scopes: Vec<String>,
    timeout: Duration,
    token_url: Option<String>,
}

impl Authenticator {
    /// Creates an authenticator over `store` with the calendar scope.
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            scopes: vec![CALENDAR_SCOPE.to_string()],
            timeout: DEFAULT_TIMEOUT,
            token_url: None,
        }
    }

    /// Replaces the requested scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Sets the timeout for token endpoint requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Points token exchanges at a different endpoint. For fixtures.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// The credential store this authenticator reads and writes.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Returns a usable access token, doing as little work as possible.
    ///
    /// A stored token that is valid for the requested scopes is returned
    /// directly, without touching the network or the OAuth client secret.
    /// An expired token with a refresh token is refreshed silently; if the
    /// provider rejects the refresh, the flow falls through to a full
    /// consent round via `broker`. Anything else (no token, unreadable
    /// token, missing refresh token, narrower scopes) goes straight to
    /// consent.
    pub fn ensure_authenticated(&self, broker: &dyn ConsentBroker) -> GoogleResult<StoredToken> {
        let stored = self.store.load_token()?;

        if let Some(token) = &stored {
            if !token.is_expired() && token.has_scopes(&self.scopes) {
                debug!("stored access token still valid");
                return Ok(token.clone());
            }
        }

        // Every remaining route needs the OAuth app credentials.
        let credentials = self.store.load_credentials()?;
        let oauth = self.oauth_client(credentials);

        if let Some(mut token) = stored {
            if token.has_scopes(&self.scopes) {
                if let Some(refresh_token) = token.refresh_token.clone() {
                    match oauth.refresh(&refresh_token) {
                        Ok((access_token, expires_in)) => {
                            token.update_access_token(access_token, expires_in);
                            self.store.save_token(&token)?;
                            info!("access token refreshed");
                            return Ok(token);
                        }
                        Err(e) if e.code() == GoogleErrorCode::Authentication => {
                            warn!("token refresh rejected, falling back to consent: {}", e);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        info!("starting interactive authorization");
        let token = oauth.authorize(&self.scopes, broker)?;
        self.store.save_token(&token)?;
        Ok(token)
    }

    fn oauth_client(&self, credentials: OAuthCredentials) -> OAuthClient {
        let client = OAuthClient::new(credentials, self.timeout);
        match &self.token_url {
            Some(url) => client.with_token_url(url.clone()),
            None => client,
        }
    }
}
