//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// calm - Your Google Calendar in the terminal
#[derive(Debug, Parser)]
#[command(name = "calm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(long = "debug", short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List today's events
    #[command(alias = "t")]
    Today {
        /// Output events as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tomorrow's events
    #[command(alias = "tmr")]
    Tomorrow {
        /// Output events as JSON
        #[arg(long)]
        json: bool,
    },

    /// List this week's events, Monday through Sunday
    #[command(alias = "w")]
    Week {
        /// Output events as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the events of one day
    #[command(alias = "d")]
    Date {
        /// The day to list, e.g. 2025-02-05
        date: String,

        /// Output events as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the OAuth client and stored tokens
    Configure {
        #[command(subcommand)]
        action: ConfigureAction,
    },
}

/// Credential management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigureAction {
    /// Import an OAuth client and authorize calendar access
    Oauth {
        /// Path to the OAuth client JSON from the Google Cloud Console
        #[arg(long)]
        path: Option<PathBuf>,

        /// Paste the OAuth client JSON on stdin instead
        #[arg(long, conflicts_with = "path")]
        paste: bool,
    },

    /// Forget stored tokens
    Reset {
        /// Also remove the imported OAuth client
        #[arg(long)]
        all: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_parses() {
        let cli = Cli::try_parse_from(["calm"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn date_takes_a_positional_day() {
        let cli = Cli::try_parse_from(["calm", "date", "2025-02-05"]).unwrap();
        match cli.command {
            Some(Command::Date { date, json }) => {
                assert_eq!(date, "2025-02-05");
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn date_requires_a_day() {
        assert!(Cli::try_parse_from(["calm", "date"]).is_err());
    }

    #[test]
    fn short_aliases_resolve() {
        assert!(matches!(
            Cli::try_parse_from(["calm", "t"]).unwrap().command,
            Some(Command::Today { .. })
        ));
        assert!(matches!(
            Cli::try_parse_from(["calm", "tmr"]).unwrap().command,
            Some(Command::Tomorrow { .. })
        ));
        assert!(matches!(
            Cli::try_parse_from(["calm", "w"]).unwrap().command,
            Some(Command::Week { .. })
        ));
        assert!(matches!(
            Cli::try_parse_from(["calm", "d", "2025-12-24"]).unwrap().command,
            Some(Command::Date { .. })
        ));
    }

    #[test]
    fn json_flag_per_listing_command() {
        let cli = Cli::try_parse_from(["calm", "week", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Week { json: true })));
    }

    #[test]
    fn debug_flag_works_after_a_subcommand() {
        let cli = Cli::try_parse_from(["calm", "today", "-v"]).unwrap();
        assert!(cli.debug);
    }

    #[test]
    fn configure_oauth_accepts_a_path() {
        let cli = Cli::try_parse_from(["calm", "configure", "oauth", "--path", "creds.json"])
            .unwrap();
        match cli.command {
            Some(Command::Configure {
                action: ConfigureAction::Oauth { path, paste },
            }) => {
                assert_eq!(path, Some(PathBuf::from("creds.json")));
                assert!(!paste);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn oauth_path_and_paste_conflict() {
        let result = Cli::try_parse_from([
            "calm", "configure", "oauth", "--path", "x.json", "--paste",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn reset_all_flag() {
        let cli = Cli::try_parse_from(["calm", "configure", "reset", "--all"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Configure {
                action: ConfigureAction::Reset { all: true }
            })
        ));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["calm", "yesterday"]).is_err());
    }
}
