//! Login command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use teamhub_core::Credentials;

use crate::cli::Globals;
use crate::commands::report;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Email address or user name
    #[arg(long)]
    pub identifier: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(args: LoginArgs, globals: &Globals) -> Result<()> {
    let ctx = globals.connect()?;
    let credentials = Credentials::new(&args.identifier, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let user = ctx
        .sessions
        .login(&credentials)
        .await
        .map_err(|e| report(e, "Failed to login"))?;

    output::success("Logged in successfully");
    println!();
    output::field("Name", &user.display_name());
    output::field("Email", &user.email);
    output::field("User ID", &user.id);

    Ok(())
}
