//! Refresh command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use teamhub_client::SignOutReason;

use crate::cli::Globals;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(_args: RefreshArgs, globals: &Globals) -> Result<()> {
    let ctx = globals.connect()?;

    eprintln!("{}", "Refreshing session...".dimmed());

    match ctx.sessions.refresh().await {
        Ok(grant) => {
            output::success("Session refreshed");
            output::field("Expires in", &format!("{}s", grant.expires_in));
            Ok(())
        }
        Err(err) => {
            ctx.sessions.sign_out(SignOutReason::from(&err));
            Err(err).context("Failed to refresh session; log in again")
        }
    }
}
