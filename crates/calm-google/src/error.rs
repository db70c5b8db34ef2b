//! Error types for Google Calendar operations.
//!
//! Every fallible operation in this crate returns [`GoogleError`], which
//! pairs a category code with a human-readable message. The codes line up
//! with how the CLI reports failures: configuration problems the user must
//! fix, authentication failures, and network/API trouble.

use std::fmt;
use thiserror::Error;

/// The category of a Google Calendar error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoogleErrorCode {
    /// Missing or invalid local configuration (OAuth client document).
    Configuration,
    /// Authentication failed: consent abandoned, state mismatch, refresh or
    /// access token rejected.
    Authentication,
    /// Network error: connection failed, timeout, DNS resolution.
    Network,
    /// The API returned an error status.
    Server,
    /// Response could not be parsed or had an unexpected shape.
    InvalidResponse,
    /// Unexpected local state, a bug.
    Internal,
}

impl GoogleErrorCode {
    /// Returns a stable snake_case name for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration_error",
            Self::Authentication => "authentication_error",
            Self::Network => "network_error",
            Self::Server => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::Internal => "internal_error",
        }
    }
}

impl fmt::Display for GoogleErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from credential handling, the consent flow, or the calendar API.
#[derive(Debug, Error)]
pub struct GoogleError {
    /// The error code categorizing this error.
    code: GoogleErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl GoogleError {
    /// Creates a new error with the given code and message.
    pub fn new(code: GoogleErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::Configuration, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::Authentication, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::Network, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::Server, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::InvalidResponse, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(GoogleErrorCode::Internal, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> GoogleErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for GoogleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for Google Calendar operations.
pub type GoogleResult<T> = Result<T, GoogleError>;
