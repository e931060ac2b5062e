//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use teamhub_core::CredentialStore;

use crate::cli::Globals;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(_args: LogoutArgs, globals: &Globals) -> Result<()> {
    // Signing out needs no server, so this skips the client stack
    globals
        .store()?
        .clear()
        .context("Failed to remove session file")?;

    output::success("Logged out");
    Ok(())
}
