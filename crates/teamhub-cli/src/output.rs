//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use teamhub_core::FormErrors;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print per-field messages from a rejected form to stderr.
pub fn form_errors(errors: &FormErrors) {
    for (field, message) in &errors.fields {
        eprintln!("  {}: {}", field.yellow(), message);
    }
    if let Some(root) = &errors.root {
        error(root);
    }
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
