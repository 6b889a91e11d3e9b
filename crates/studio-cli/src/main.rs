//! LLM Studio CLI - operator tooling for the auth core.

mod commands;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use studio_core::LogFormat;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "llm-studio")]
#[command(about = "LLM Studio - session and role administration")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (defaults to the state directory)
    #[arg(long, global = true, env = "LLM_STUDIO_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigCommands>,
    },

    /// Inspect the local user directory
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Validate the config file
    Validate,
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users, newest first
    List {
        /// Page size (non-positive uses the configured default)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Rows to skip (negative reads as 0)
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,
    },

    /// Show one user's profile
    Show {
        /// Identity-provider uid
        id: String,
    },
}

fn init_logging(verbose: bool, debug: bool, format: LogFormat) {
    let filter = if verbose || debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(false)).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = commands::config::resolve_path(cli.config.as_deref());
    let loaded = commands::config::load(&path);

    let (debug, format) = loaded
        .as_ref()
        .map(|c| (c.settings.debug, c.settings.log_format))
        .unwrap_or_default();
    init_logging(cli.verbose, debug, format);

    match cli.command {
        Commands::Config { action } => {
            let action = match action {
                Some(ConfigCommands::Path) => commands::config::ConfigAction::Path,
                Some(ConfigCommands::Validate) => commands::config::ConfigAction::Validate,
                Some(ConfigCommands::Show) | None => commands::config::ConfigAction::Show,
            };
            commands::run_config(action, &path, loaded)?;
        }

        Commands::Users { action } => {
            let config = loaded?;
            let action = match action {
                UserCommands::List { limit, offset } => {
                    commands::users::UsersAction::List { limit, offset }
                }
                UserCommands::Show { id } => commands::users::UsersAction::Show { id },
            };
            commands::run_users(action, &config).await?;
        }
    }

    Ok(())
}
