//! Credential management commands.

use std::io::BufRead;
use std::path::PathBuf;

use tracing::info;

use calm_google::{Authenticator, CredentialStore, InteractiveConsent};

use crate::error::{CliError, CliResult};

/// Imports an OAuth client and runs the authorization flow.
///
/// The client JSON comes from `--path`, from stdin with `--paste`, or, with
/// neither, the previously imported one is reused. Any stored token is
/// cleared first so the flow always ends in a fresh grant.
pub fn oauth(path: Option<PathBuf>, paste: bool) -> CliResult<()> {
    let store = CredentialStore::open_default();

    let raw = match (path, paste) {
        (Some(path), _) => Some(std::fs::read_to_string(&path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?),
        (None, true) => Some(read_pasted()?),
        (None, false) => None,
    };

    match raw {
        Some(raw) => {
            store.import_credentials(&raw)?;
            println!("OAuth client saved to {}", store.credentials_path().display());
        }
        None => {
            if !store.has_credentials() {
                return Err(CliError::Config(format!(
                    "no OAuth client found at {}; pass --path <file> or --paste",
                    store.credentials_path().display()
                )));
            }
        }
    }

    // The old grant belongs to whatever client was configured before.
    store.clear_token()?;

    println!();
    println!("Starting Google Calendar authorization...");
    println!();
    println!("A browser window will open for you to authorize access.");
    println!("If the browser doesn't open, check the terminal for a URL to copy.");
    println!();

    let auth = Authenticator::new(store);
    auth.ensure_authenticated(&InteractiveConsent::new())?;

    info!("authorization complete");
    println!();
    println!("Authorization successful!");
    println!("You can now run 'calm today' to list your events.");

    Ok(())
}

/// Forgets stored tokens, and with `all` the OAuth client too.
pub fn reset(all: bool) -> CliResult<()> {
    let store = CredentialStore::open_default();

    if all {
        store.clear_all()?;
        println!("Removed stored tokens and the OAuth client from {}", store.dir().display());
    } else {
        store.clear_token()?;
        println!("Removed stored tokens from {}", store.dir().display());
        println!("The OAuth client is kept; use 'calm configure reset --all' to remove it too.");
    }

    Ok(())
}

/// Reads OAuth client JSON from stdin until `END` or end of input.
fn read_pasted() -> CliResult<String> {
    println!("Paste the OAuth client JSON, then type END on its own line (or press Ctrl-D):");

    let stdin = std::io::stdin();
    let mut raw = String::new();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim() == "END" {
            break;
        }
        raw.push_str(&line);
        raw.push('\n');
    }

    Ok(raw)
}
