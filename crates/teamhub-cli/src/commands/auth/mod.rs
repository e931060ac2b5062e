//! Account and session subcommands.

mod confirm;
mod login;
mod logout;
mod password;
mod refresh;
mod register;
mod whoami;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::Globals;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Sign in and store the session
    Login(login::LoginArgs),

    /// Create an account
    Register(register::RegisterArgs),

    /// Email a password-reset link
    ForgotPassword(password::ForgotPasswordArgs),

    /// Set a new password with a reset token
    ResetPassword(password::ResetPasswordArgs),

    /// Email a new confirmation code
    ResendCode(confirm::ResendCodeArgs),

    /// Confirm an email address
    ConfirmEmail(confirm::ConfirmEmailArgs),

    /// Display the stored session
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for a new token pair
    Refresh(refresh::RefreshArgs),

    /// Clear the stored session
    Logout(logout::LogoutArgs),
}

pub async fn handle(cmd: AuthCommand, globals: &Globals) -> Result<()> {
    match cmd.command {
        AuthSubcommand::Login(args) => login::run(args, globals).await,
        AuthSubcommand::Register(args) => register::run(args, globals).await,
        AuthSubcommand::ForgotPassword(args) => password::forgot(args, globals).await,
        AuthSubcommand::ResetPassword(args) => password::reset(args, globals).await,
        AuthSubcommand::ResendCode(args) => confirm::resend(args, globals).await,
        AuthSubcommand::ConfirmEmail(args) => confirm::confirm(args, globals).await,
        AuthSubcommand::Whoami(args) => whoami::run(args, globals),
        AuthSubcommand::Refresh(args) => refresh::run(args, globals).await,
        AuthSubcommand::Logout(args) => logout::run(args, globals),
    }
}
