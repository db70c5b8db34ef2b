//! OAuth 2.0 authorization-code flow with PKCE for Google APIs.
//!
//! # Flow Overview
//!
//! 1. Generate a PKCE verifier/challenge pair and a CSRF state value
//! 2. Hand a [`ConsentBroker`] the authorization URL; it returns the code
//! 3. Verify the echoed state, then exchange the code for tokens
//!
//! Refreshes skip the broker entirely and go straight to the token endpoint
//! with the stored refresh token.
//!
//! # Security
//!
//! - PKCE (RFC 7636) with S256 prevents authorization code interception
//! - The state parameter is verified against CSRF
//! - Tokens never appear in logs

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::consent::ConsentBroker;
use crate::credentials::OAuthCredentials;
use crate::error::{GoogleError, GoogleResult};
use crate::tokens::StoredToken;

/// Google's OAuth 2.0 authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google's OAuth 2.0 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Length of the random PKCE code verifier in bytes (before encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Client for the OAuth authorization-code and refresh exchanges.
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http_client: reqwest::blocking::Client,
    token_url: String,
}

impl OAuthClient {
    /// Creates a client for the given OAuth app credentials.
    pub fn new(credentials: OAuthCredentials, timeout: Duration) -> Self {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");
        Self {
            credentials,
            http_client,
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    /// Points the token exchange at a different endpoint. For fixtures.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Runs the full authorization flow for the given scopes.
    ///
    /// The broker supplies the authorization code; this verifies the echoed
    /// CSRF state and exchanges the code for tokens.
    pub fn authorize(
        &self,
        scopes: &[String],
        broker: &dyn ConsentBroker,
    ) -> GoogleResult<StoredToken> {
        let pkce = PkceFlow::new();

        let reply = broker.obtain_code(&|redirect_uri| {
            pkce.build_auth_url(&self.credentials.client_id, redirect_uri, scopes)
        })?;

        if reply.state != pkce.state {
            return Err(GoogleError::authentication(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }

        info!("received authorization code, exchanging for tokens...");
        self.exchange_code(&reply.code, &pkce.verifier, &reply.redirect_uri, scopes)
    }

    /// Exchanges a refresh token for a fresh access token.
    ///
    /// Returns the new access token and its lifetime in seconds. Google does
    /// not rotate the refresh token on this path.
    pub fn refresh(&self, refresh_token: &str) -> GoogleResult<(String, Option<i64>)> {
        debug!("refreshing access token");

        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .map_err(|e| {
                GoogleError::network(format!("token refresh request failed: {}", e)).with_source(e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| GoogleError::network(format!("failed to read refresh response: {}", e)))?;

        if !status.is_success() {
            return Err(GoogleError::authentication(format!(
                "token refresh failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            GoogleError::invalid_response(format!("malformed token response: {}", e))
        })?;

        Ok((token.access_token, token.expires_in))
    }

    /// Exchanges an authorization code for tokens.
    fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> GoogleResult<StoredToken> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .map_err(|e| {
                GoogleError::network(format!("token exchange request failed: {}", e)).with_source(e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| GoogleError::network(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            return Err(GoogleError::authentication(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            GoogleError::invalid_response(format!("malformed token response: {}", e))
        })?;

        Ok(StoredToken::new(
            token.access_token,
            token.refresh_token,
            token.expires_in,
            scopes.to_vec(),
        ))
    }
}

/// State for one PKCE authorization round.
pub struct PkceFlow {
    /// The code verifier (kept secret until the token exchange).
    pub verifier: String,
    /// The S256 challenge derived from the verifier.
    pub challenge: String,
    /// Random state for CSRF protection.
    pub state: String,
}

impl PkceFlow {
    /// Generates a fresh verifier, challenge, and state.
    pub fn new() -> Self {
        let verifier = Self::generate_verifier();
        let challenge = Self::compute_challenge(&verifier);
        let state = Self::generate_state();
        Self {
            verifier,
            challenge,
            state,
        }
    }

    /// Generates a cryptographically random code verifier.
    fn generate_verifier() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..CODE_VERIFIER_LENGTH).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Computes the S256 challenge for a verifier.
    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    /// Generates a random state value for CSRF protection.
    fn generate_state() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..16).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Builds the authorization URL the user consents at.
    ///
    /// `access_type=offline` and `prompt=consent` make Google return a
    /// refresh token on every grant, not only the first.
    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        let scope = scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&code_challenge={}&code_challenge_method=S256&state={}&access_type=offline&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Token endpoint response.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consent::{ConsentReply, ScriptedConsent};
    use crate::error::GoogleErrorCode;

    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn credentials() -> OAuthCredentials {
        OAuthCredentials::new(
            "id-123.apps.googleusercontent.com".to_string(),
            "secret-456".to_string(),
        )
    }

    fn scopes() -> Vec<String> {
        vec!["https://www.googleapis.com/auth/calendar".to_string()]
    }

    /// Serves scripted responses on a local port and records request bodies.
    fn token_endpoint(
        responses: Vec<(u16, &'static str)>,
    ) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut bodies = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                bodies.push(read_request_body(&mut stream));
                let reason = if status == 200 { "OK" } else { "Bad Request" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
            bodies
        });

        (url, handle)
    }

    fn read_request_body(stream: &mut std::net::TcpStream) -> String {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                break;
            }
            let lower = trimmed.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();
        String::from_utf8(body).unwrap()
    }

    mod pkce {
        use super::*;

        #[test]
        fn verifier_has_expected_length() {
            let flow = PkceFlow::new();
            // 32 random bytes encode to 43 base64url characters.
            assert_eq!(flow.verifier.len(), 43);
        }

        #[test]
        fn challenge_is_deterministic() {
            let challenge1 = PkceFlow::compute_challenge("test_verifier");
            let challenge2 = PkceFlow::compute_challenge("test_verifier");
            assert_eq!(challenge1, challenge2);
        }

        #[test]
        fn distinct_verifiers_yield_distinct_challenges() {
            let flow1 = PkceFlow::new();
            let flow2 = PkceFlow::new();
            assert_ne!(flow1.verifier, flow2.verifier);
            assert_ne!(flow1.challenge, flow2.challenge);
            assert_ne!(flow1.state, flow2.state);
        }

        #[test]
        fn auth_url_carries_all_parameters() {
            let flow = PkceFlow::new();
            let url = flow.build_auth_url(
                "client-id.apps.googleusercontent.com",
                "http://127.0.0.1:8080/callback",
                &scopes(),
            );

            assert!(url.starts_with(GOOGLE_AUTH_URL));
            assert!(url.contains("response_type=code"));
            assert!(url.contains("code_challenge_method=S256"));
            assert!(url.contains("access_type=offline"));
            assert!(url.contains("prompt=consent"));
            assert!(url.contains(&format!("code_challenge={}", flow.challenge)));
            assert!(url.contains(&format!("state={}", flow.state)));
            assert!(url.contains("calendar"));
        }
    }

    mod authorize {
        use super::*;

        #[test]
        fn scripted_consent_exchanges_the_code() {
            let token_json = r#"{"access_token":"at-1","refresh_token":"rt-1","expires_in":3600}"#;
            let (url, server) = token_endpoint(vec![(200, token_json)]);

            let client = OAuthClient::new(credentials(), Duration::from_secs(5))
                .with_token_url(url);
            let broker = ScriptedConsent::new("auth-code-9");

            let token = client.authorize(&scopes(), &broker).unwrap();
            assert_eq!(token.access_token, "at-1");
            assert_eq!(token.refresh_token.as_deref(), Some("rt-1"));
            assert!(!token.is_expired());
            assert_eq!(token.scopes, scopes());

            let bodies = server.join().unwrap();
            assert!(bodies[0].contains("grant_type=authorization_code"));
            assert!(bodies[0].contains("code=auth-code-9"));
            assert!(bodies[0].contains("code_verifier="));
            assert!(bodies[0].contains("client_id=id-123"));
        }

        #[test]
        fn state_mismatch_is_rejected_before_any_exchange() {
            struct TamperedConsent;

            impl ConsentBroker for TamperedConsent {
                fn obtain_code(
                    &self,
                    make_auth_url: &dyn Fn(&str) -> String,
                ) -> GoogleResult<ConsentReply> {
                    let _ = make_auth_url("http://127.0.0.1:1/callback");
                    Ok(ConsentReply {
                        code: "stolen".to_string(),
                        state: "not-the-state".to_string(),
                        redirect_uri: "http://127.0.0.1:1/callback".to_string(),
                    })
                }
            }

            // Unroutable token URL: reaching it would fail loudly.
            let client = OAuthClient::new(credentials(), Duration::from_secs(5))
                .with_token_url("http://127.0.0.1:1");

            let err = client.authorize(&scopes(), &TamperedConsent).unwrap_err();
            assert_eq!(err.code(), GoogleErrorCode::Authentication);
            assert!(err.message().contains("state mismatch"));
        }

        #[test]
        fn provider_rejection_is_an_authentication_error() {
            let (url, server) = token_endpoint(vec![(400, r#"{"error":"invalid_grant"}"#)]);

            let client = OAuthClient::new(credentials(), Duration::from_secs(5))
                .with_token_url(url);
            let broker = ScriptedConsent::new("expired-code");

            let err = client.authorize(&scopes(), &broker).unwrap_err();
            assert_eq!(err.code(), GoogleErrorCode::Authentication);
            assert!(err.message().contains("invalid_grant"));
            server.join().unwrap();
        }

        #[test]
        fn garbage_token_response_is_invalid_response() {
            let (url, server) = token_endpoint(vec![(200, "not json at all")]);

            let client = OAuthClient::new(credentials(), Duration::from_secs(5))
                .with_token_url(url);
            let broker = ScriptedConsent::new("code");

            let err = client.authorize(&scopes(), &broker).unwrap_err();
            assert_eq!(err.code(), GoogleErrorCode::InvalidResponse);
            server.join().unwrap();
        }
    }

    mod refresh {
        use super::*;

        #[test]
        fn success_returns_new_access_token() {
            let token_json = r#"{"access_token":"at-fresh","expires_in":3599}"#;
            let (url, server) = token_endpoint(vec![(200, token_json)]);

            let client = OAuthClient::new(credentials(), Duration::from_secs(5))
                .with_token_url(url);

            let (access, expires_in) = client.refresh("rt-stored").unwrap();
            assert_eq!(access, "at-fresh");
            assert_eq!(expires_in, Some(3599));

            let bodies = server.join().unwrap();
            assert!(bodies[0].contains("grant_type=refresh_token"));
            assert!(bodies[0].contains("refresh_token=rt-stored"));
        }

        #[test]
        fn revoked_grant_is_an_authentication_error() {
            let (url, server) = token_endpoint(vec![(400, r#"{"error":"invalid_grant"}"#)]);

            let client = OAuthClient::new(credentials(), Duration::from_secs(5))
                .with_token_url(url);

            let err = client.refresh("rt-revoked").unwrap_err();
            assert_eq!(err.code(), GoogleErrorCode::Authentication);
            server.join().unwrap();
        }

        #[test]
        fn unreachable_endpoint_is_a_network_error() {
            let client = OAuthClient::new(credentials(), Duration::from_secs(1))
                .with_token_url("http://127.0.0.1:1");

            let err = client.refresh("rt").unwrap_err();
            assert_eq!(err.code(), GoogleErrorCode::Network);
        }
    }
}
