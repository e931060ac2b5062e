//! Subcommand implementations.

pub mod api;
pub mod auth;

use colored::Colorize;
use teamhub_core::Error;

use crate::output;

/// Print what the server said about a failed request, then wrap it.
pub fn report(err: Error, action: &str) -> anyhow::Error {
    match &err {
        Error::Api(api) if !api.is_unauthorized() => output::form_errors(&api.form_errors()),
        _ => eprintln!("{}", err.user_message().dimmed()),
    }
    anyhow::Error::new(err).context(action.to_string())
}
