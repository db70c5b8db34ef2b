//! calm CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use calm_cli::cli::{Cli, Command, ConfigureAction};
use calm_cli::commands;
use calm_cli::error::CliResult;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Some(Command::Today { json }) => commands::events::today(json),
        Some(Command::Tomorrow { json }) => commands::events::tomorrow(json),
        Some(Command::Week { json }) => commands::events::week(json),
        Some(Command::Date { date, json }) => commands::events::date(&date, json),
        Some(Command::Configure { action }) => match action {
            ConfigureAction::Oauth { path, paste } => commands::configure::oauth(path, paste),
            ConfigureAction::Reset { all } => commands::configure::reset(all),
        },
        None => {
            println!("calm - Your Google Calendar in the terminal");
            println!();
            println!("Run 'calm --help' for usage information.");
            println!();
            println!("Quick start:");
            println!("  1. Import an OAuth client: calm configure oauth --path <credentials.json>");
            println!("  2. List today's events:    calm today");
            Ok(())
        }
    }
}
