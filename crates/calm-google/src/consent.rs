//! Consent brokers: how the authorization code reaches this process.
//!
//! The authorization-code flow has a user-facing half (send the user to
//! Google's consent page, collect the redirected code) and a wire half (build
//! the URL, exchange the code). The user-facing half sits behind
//! [`ConsentBroker`] so the auth flow can run without a browser:
//!
//! - [`InteractiveConsent`] binds a loopback HTTP listener, opens the system
//!   browser, and blocks until Google redirects back with the code.
//! - [`ScriptedConsent`] returns a canned code immediately, echoing the CSRF
//!   state it finds in the authorization URL.
//!
//! # Security
//!
//! - The loopback server only accepts connections from localhost
//! - The state parameter is echoed back for CSRF verification upstream
//! - The listener answers exactly one callback, then goes away

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::{GoogleError, GoogleResult};

/// Default port range for the loopback callback server.
pub const DEFAULT_PORT_RANGE: (u16, u16) = (8080, 8090);

/// How long the interactive broker waits for the browser callback.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300); // 5 minutes

/// The outcome of one consent round.
#[derive(Debug, Clone)]
pub struct ConsentReply {
    /// The authorization code to exchange for tokens.
    pub code: String,
    /// The echoed CSRF state parameter (may be empty if the provider
    /// dropped it).
    pub state: String,
    /// The redirect URI the code was delivered to. The token exchange must
    /// repeat it verbatim.
    pub redirect_uri: String,
}

/// The user-facing half of the authorization-code flow.
///
/// A broker decides its own redirect URI, calls `make_auth_url` with it to
/// obtain the full authorization URL, presents that URL to the user, and
/// blocks until an authorization code comes back.
pub trait ConsentBroker {
    /// Runs one consent round.
    fn obtain_code(&self, make_auth_url: &dyn Fn(&str) -> String) -> GoogleResult<ConsentReply>;
}

/// Real consent: loopback listener plus the system browser.
#[derive(Debug, Clone)]
pub struct InteractiveConsent {
    port_range: (u16, u16),
    timeout: Duration,
}

impl InteractiveConsent {
    /// Creates a broker with the default port range and timeout.
    pub fn new() -> Self {
        Self {
            port_range: DEFAULT_PORT_RANGE,
            timeout: CALLBACK_TIMEOUT,
        }
    }

    /// Sets the loopback port range to try.
    pub fn with_port_range(mut self, start: u16, end: u16) -> Self {
        self.port_range = (start, end);
        self
    }

    /// Sets how long to wait for the browser callback.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tries to bind a TCP listener on an available port in the range.
    fn bind_loopback(port_range: (u16, u16)) -> GoogleResult<(TcpListener, u16)> {
        for port in port_range.0..=port_range.1 {
            match TcpListener::bind(format!("127.0.0.1:{}", port)) {
                Ok(listener) => {
                    debug!("bound loopback server on port {}", port);
                    return Ok((listener, port));
                }
                Err(_) => continue,
            }
        }
        Err(GoogleError::configuration(format!(
            "no available port in range {}-{}",
            port_range.0, port_range.1
        )))
    }

    /// Waits for the OAuth callback and extracts the authorization code.
    fn wait_for_callback(
        listener: TcpListener,
        timeout: Duration,
    ) -> GoogleResult<(String, String)> {
        listener
            .set_nonblocking(false)
            .map_err(|e| GoogleError::internal(format!("failed to set blocking: {}", e)))?;

        let (tx, rx) = mpsc::channel();

        // Accept on a separate thread so the wait can time out.
        let _handle = thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        if let Some(result) = Self::handle_callback(stream) {
                            let _ = tx.send(result);
                            return;
                        }
                    }
                    Err(e) => {
                        error!("failed to accept connection: {}", e);
                    }
                }
            }
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(GoogleError::authentication(
                "consent timed out waiting for the browser callback",
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(GoogleError::internal("callback channel disconnected"))
            }
        }
    }

    /// Handles one HTTP request on the callback server.
    ///
    /// Returns `None` for requests that are not the redirect (favicon,
    /// probes), so the accept loop keeps waiting.
    fn handle_callback(mut stream: TcpStream) -> Option<GoogleResult<(String, String)>> {
        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();

        if reader.read_line(&mut request_line).is_err() {
            return None;
        }

        // Request line: GET /callback?code=...&state=... HTTP/1.1
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() < 2 || parts[0] != "GET" {
            return None;
        }

        let outcome = parse_callback_path(parts[1])?;

        let response = match outcome {
            CallbackOutcome::Granted { .. } => {
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
                <html><body><h1>Authorization Successful</h1>\
                <p>You can close this window and return to the terminal.</p></body></html>"
            }
            _ => {
                "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
                <html><body><h1>Authorization Failed</h1>\
                <p>You can close this window.</p></body></html>"
            }
        };
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();

        Some(match outcome {
            CallbackOutcome::Granted { code, state } => Ok((code, state)),
            CallbackOutcome::Denied(reason) => Err(GoogleError::authentication(format!(
                "authorization denied: {}",
                reason
            ))),
            CallbackOutcome::Incomplete => Err(GoogleError::authentication(
                "missing authorization code in callback",
            )),
        })
    }
}

impl Default for InteractiveConsent {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsentBroker for InteractiveConsent {
    fn obtain_code(&self, make_auth_url: &dyn Fn(&str) -> String) -> GoogleResult<ConsentReply> {
        let (listener, port) = Self::bind_loopback(self.port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);
        let auth_url = make_auth_url(&redirect_uri);

        info!("starting OAuth consent, opening browser...");
        debug!("authorization URL: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
        }

        let (code, state) = Self::wait_for_callback(listener, self.timeout)?;
        Ok(ConsentReply {
            code,
            state,
            redirect_uri,
        })
    }
}

/// Canned consent for scripted flows and tests.
///
/// Supplies a fixed authorization code without user interaction and echoes
/// the CSRF state found in the authorization URL, so the upstream state
/// verification still runs.
#[derive(Debug, Clone)]
pub struct ScriptedConsent {
    code: String,
    redirect_uri: String,
}

impl ScriptedConsent {
    /// Creates a broker that yields `code`.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            redirect_uri: "http://127.0.0.1:1/callback".to_string(),
        }
    }

    /// Overrides the redirect URI reported alongside the code.
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }
}

impl ConsentBroker for ScriptedConsent {
    fn obtain_code(&self, make_auth_url: &dyn Fn(&str) -> String) -> GoogleResult<ConsentReply> {
        let auth_url = make_auth_url(&self.redirect_uri);
        let state = query_param(&auth_url, "state").unwrap_or_default();
        Ok(ConsentReply {
            code: self.code.clone(),
            state,
            redirect_uri: self.redirect_uri.clone(),
        })
    }
}

/// What the redirect request carried.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CallbackOutcome {
    Granted { code: String, state: String },
    Denied(String),
    Incomplete,
}

/// Parses the redirect request path.
///
/// Returns `None` for paths other than `/callback`.
fn parse_callback_path(path: &str) -> Option<CallbackOutcome> {
    if !path.starts_with("/callback") {
        return None;
    }

    let query = path.split_once('?').map(|(_, q)| q).unwrap_or("");
    let mut code = None;
    let mut state = None;
    let mut error = None;

    for param in query.split('&') {
        let mut kv = param.splitn(2, '=');
        if let (Some(key), Some(value)) = (kv.next(), kv.next()) {
            let value = urlencoding::decode(value).unwrap_or_default().into_owned();
            match key {
                "code" => code = Some(value),
                "state" => state = Some(value),
                "error" => error = Some(value),
                _ => {}
            }
        }
    }

    Some(if let Some(error) = error {
        CallbackOutcome::Denied(error)
    } else if let Some(code) = code {
        CallbackOutcome::Granted {
            code,
            state: state.unwrap_or_default(),
        }
    } else {
        CallbackOutcome::Incomplete
    })
}

/// Extracts one query parameter from a URL, percent-decoded.
fn query_param(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    for param in query.split('&') {
        let mut kv = param.splitn(2, '=');
        if let (Some(k), Some(value)) = (kv.next(), kv.next()) {
            if k == key {
                return Some(urlencoding::decode(value).unwrap_or_default().into_owned());
            }
        }
    }
    None
}
