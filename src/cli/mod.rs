pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "feedbackctl")]
#[command(about = "Feedback CLI - user provisioning and deployment helpers for the Feedback API")]
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
    #[command(about = "Provision accounts in the user directory")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UsersCommands,
    },

    #[command(about = "Front-end site deployment helpers")]
    Site {
        #[command(subcommand)]
        cmd: commands::site::SiteCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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
        Commands::Users { cmd } => commands::users::handle(cmd, output_format).await,
        Commands::Site { cmd } => commands::site::handle(cmd, output_format).await,
    }
}
