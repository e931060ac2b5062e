//! Register command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use teamhub_core::{AuthApi, Registration};

use crate::cli::Globals;
use crate::commands::report;
use crate::output;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub user_name: String,
}

pub async fn run(args: RegisterArgs, globals: &Globals) -> Result<()> {
    let ctx = globals.connect()?;
    let registration = Registration {
        email: args.email,
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
        user_name: args.user_name,
    };

    eprintln!("{}", "Creating account...".dimmed());

    ctx.auth
        .register(&registration)
        .await
        .map_err(|e| report(e, "Failed to create account"))?;

    output::success("Account created");
    eprintln!(
        "{}",
        "Check your inbox for a confirmation code, then run 'teamhub auth confirm-email'.".dimmed()
    );

    Ok(())
}
