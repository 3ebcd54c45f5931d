pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "iskolar")]
#[command(about = "Iskolar CLI - Command-line interface for the scholarship platform API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Remote server selection and health")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Authentication and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Configuration list management (admin token required)")]
    Taxonomy {
        #[command(subcommand)]
        cmd: commands::taxonomy::TaxonomyCommands,
    },

    #[command(about = "Verification review queue (admin token required)")]
    Review {
        #[command(subcommand)]
        cmd: commands::review::ReviewCommands,
    },

    #[command(about = "Load configuration fixtures from YAML")]
    Fixture {
        #[command(subcommand)]
        cmd: commands::fixture::FixtureCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Taxonomy { cmd } => commands::taxonomy::handle(cmd, output_format).await,
        Commands::Review { cmd } => commands::review::handle(cmd, output_format).await,
        Commands::Fixture { cmd } => commands::fixture::handle(cmd, output_format).await,
    }
}
