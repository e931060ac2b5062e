//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};

use teamhub_client::config::{ENV_API_URL, ENV_TIMEOUT_SECS};

use crate::commands::api::ApiCommand;
use crate::commands::auth::AuthCommand;

/// Command-line client for the teamhub API.
#[derive(Parser, Debug)]
#[command(name = "teamhub")]
#[command(author, version = env!("TEAMHUB_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub globals: Globals,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Globals {
    /// API base URL
    #[arg(long, env = ENV_API_URL, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = ENV_TIMEOUT_SECS, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in, sign out and manage the account
    Auth(AuthCommand),

    /// Send an authenticated request
    Api(ApiCommand),
}
