//! Password recovery commands.

use anyhow::Result;
use clap::Args;

use teamhub_core::AuthApi;

use crate::cli::Globals;
use crate::commands::report;
use crate::output;

#[derive(Args, Debug)]
pub struct ForgotPasswordArgs {
    /// Account email address
    #[arg(long)]
    pub email: String,
}

#[derive(Args, Debug)]
pub struct ResetPasswordArgs {
    /// Token from the reset link
    #[arg(long)]
    pub token: String,

    /// User ID from the reset link
    #[arg(long)]
    pub user_id: String,

    #[arg(long)]
    pub new_password: String,
}

pub async fn forgot(args: ForgotPasswordArgs, globals: &Globals) -> Result<()> {
    let ctx = globals.connect()?;
    ctx.auth
        .request_password_reset(&args.email)
        .await
        .map_err(|e| report(e, "Failed to request a password reset"))?;

    output::success("If the address is registered, a reset link is on its way");
    Ok(())
}

pub async fn reset(args: ResetPasswordArgs, globals: &Globals) -> Result<()> {
    let ctx = globals.connect()?;
    ctx.auth
        .reset_password(&args.token, &args.user_id, &args.new_password)
        .await
        .map_err(|e| report(e, "Failed to reset password"))?;

    output::success("Password changed. Log in with the new password.");
    Ok(())
}
