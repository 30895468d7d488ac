//! ContentForge CLI — the main entry point.
//!
//! Commands:
//! - `optimize` — Run the five-stage pipeline over a document
//! - `models`   — List the rewrite model catalog
//! - `rules`    — Show the rule set for a content profile
//! - `config`   — Show, locate, create or validate the config file
//! - `doctor`   — Diagnose setup problems

use clap::{Parser, Subcommand};

mod commands;

use commands::optimize::OptimizeArgs;

#[derive(Parser)]
#[command(
    name = "contentforge",
    about = "ContentForge — multi-stage content optimization for search and AI answer engines",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a document and print the report
    Optimize(OptimizeArgs),

    /// List the models available for rewriting
    Models,

    /// Show the structural rules applied for a content profile
    Rules {
        /// Content profile (omit to list every profile)
        #[arg(short, long)]
        profile: Option<contentforge_core::ContentProfile>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and credentials
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Load and validate the config file
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so reports on stdout stay pipeable
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Optimize(args) => commands::optimize::run(args).await?,
        Commands::Models => commands::models::run().await?,
        Commands::Rules { profile } => commands::rules::run(profile).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
