//! Email confirmation commands.

use anyhow::Result;
use clap::Args;

use teamhub_core::AuthApi;

use crate::cli::Globals;
use crate::commands::report;
use crate::output;

#[derive(Args, Debug)]
pub struct ResendCodeArgs {
    #[arg(long)]
    pub email: String,
}

#[derive(Args, Debug)]
pub struct ConfirmEmailArgs {
    #[arg(long)]
    pub user_id: String,

    /// Code from the confirmation email
    #[arg(long)]
    pub code: String,
}

pub async fn resend(args: ResendCodeArgs, globals: &Globals) -> Result<()> {
    let ctx = globals.connect()?;
    ctx.auth
        .resend_confirmation_code(&args.email)
        .await
        .map_err(|e| report(e, "Failed to resend confirmation code"))?;

    output::success("Confirmation code sent");
    Ok(())
}

pub async fn confirm(args: ConfirmEmailArgs, globals: &Globals) -> Result<()> {
    let ctx = globals.connect()?;
    ctx.auth
        .confirm_email(&args.user_id, &args.code)
        .await
        .map_err(|e| report(e, "Failed to confirm email"))?;

    // Confirmation does not sign in
    output::success("Email confirmed. You can now log in.");
    Ok(())
}
