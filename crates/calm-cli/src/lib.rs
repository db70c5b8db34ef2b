//! The `calm` command-line interface.
//!
//! Subcommands answer one question: what is on the calendar today, tomorrow,
//! this week, or on a given day. `configure` manages the OAuth client and
//! stored tokens under `~/.calm/`.

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::Cli;
pub use error::{CliError, CliResult};
