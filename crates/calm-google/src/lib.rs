//! Google Calendar access: OAuth 2.0 PKCE auth and the events API.
//!
//! This crate owns everything between the CLI and Google:
//!
//! - [`CredentialStore`] - On-disk OAuth client and token files
//! - [`Authenticator`] - Stored-token / silent-refresh / consent decision
//! - [`ConsentBroker`] - How the authorization code reaches the process
//! - [`CalendarClient`] - Blocking `events.list` client
//! - [`GoogleError`] - Error type for all of the above
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ CredentialStore  │  credentials.json / token.json
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌─────────────────┐
//! │  Authenticator   │────▶│  ConsentBroker  │  browser or scripted
//! └────────┬─────────┘     └─────────────────┘
//!          │ access token
//!          ▼
//! ┌──────────────────┐
//! │  CalendarClient  │────▶ Vec<Event>
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use calm_google::{Authenticator, CalendarClient, CredentialStore, InteractiveConsent};
//!
//! let auth = Authenticator::new(CredentialStore::open_default());
//! let token = auth.ensure_authenticated(&InteractiveConsent::new())?;
//! let client = CalendarClient::new(&token.access_token, timeout);
//! let events = client.list_events("primary", &window)?;
//! ```

pub mod auth;
pub mod client;
pub mod consent;
pub mod credentials;
pub mod error;
pub mod oauth;
pub mod store;
pub mod tokens;

// Re-export main types at crate root
pub use auth::{Authenticator, CALENDAR_SCOPE};
pub use client::CalendarClient;
pub use consent::{ConsentBroker, ConsentReply, InteractiveConsent, ScriptedConsent};
pub use credentials::OAuthCredentials;
pub use error::{GoogleError, GoogleErrorCode, GoogleResult};
pub use oauth::{OAuthClient, PkceFlow};
pub use store::CredentialStore;
pub use tokens::StoredToken;
