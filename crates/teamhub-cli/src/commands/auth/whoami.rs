//! Whoami command implementation.

use anyhow::{Result, bail};
use chrono::Utc;
use clap::Args;

use teamhub_core::{CredentialStore, SessionPolicy};

use crate::cli::Globals;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the session summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: WhoamiArgs, globals: &Globals) -> Result<()> {
    let session = globals.store()?.read();
    let now = Utc::now();

    if !session.is_authenticated(now) {
        bail!("No active session. Run 'teamhub auth login' first.");
    }

    let stale = session.is_access_token_stale(now, SessionPolicy::default().stale_margin);
    let access_expires = session.access_token_expires_at().map(|t| t.to_rfc3339());
    let refresh_expires = session.refresh_token_expires_at.map(|t| t.to_rfc3339());

    if args.json {
        return output::json_pretty(&serde_json::json!({
            "user": session.user,
            "accessTokenStale": stale,
            "accessTokenExpiresAt": access_expires,
            "refreshTokenExpiresAt": refresh_expires,
        }));
    }

    if let Some(user) = &session.user {
        output::field("Name", &user.display_name());
        output::field("Email", &user.email);
        output::field("User ID", &user.id);
    }
    output::field(
        "Access token",
        match (stale, access_expires.as_deref()) {
            (false, Some(at)) => at,
            (true, _) => "stale",
            (false, None) => "unknown",
        },
    );
    if let Some(at) = &refresh_expires {
        output::field("Refresh token", at);
    }

    Ok(())
}
