//! Authenticated request commands.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::Value;

use teamhub_client::ApiRequest;

use crate::cli::Globals;
use crate::commands::report;
use crate::output;

#[derive(Args, Debug)]
pub struct ApiCommand {
    #[command(subcommand)]
    pub command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ApiSubcommand {
    /// GET a resource
    Get(QueryArgs),

    /// DELETE a resource
    Delete(QueryArgs),

    /// POST a JSON body
    Post(BodyArgs),

    /// PUT a JSON body
    Put(BodyArgs),

    /// PATCH a JSON body
    Patch(BodyArgs),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Path relative to the API base URL, e.g. /Projects
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", short = 'q', value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct BodyArgs {
    #[command(flatten)]
    pub target: QueryArgs,

    /// JSON request body
    #[arg(long, short = 'd')]
    pub data: Option<String>,
}

pub async fn handle(cmd: ApiCommand, globals: &Globals) -> Result<()> {
    let (request, pretty) = match cmd.command {
        ApiSubcommand::Get(args) => build(ApiRequest::get(&args.path), args, None)?,
        ApiSubcommand::Delete(args) => build(ApiRequest::delete(&args.path), args, None)?,
        ApiSubcommand::Post(args) => {
            build(ApiRequest::post(&args.target.path), args.target, args.data)?
        }
        ApiSubcommand::Put(args) => {
            build(ApiRequest::put(&args.target.path), args.target, args.data)?
        }
        ApiSubcommand::Patch(args) => {
            build(ApiRequest::patch(&args.target.path), args.target, args.data)?
        }
    };

    let ctx = globals.connect()?;
    let failed = format!("{} {} failed", request.method(), request.path());
    let response = ctx
        .gateway
        .send(request)
        .await
        .map_err(|e| report(e, &failed))?;

    if response.is_empty() {
        eprintln!("{}", format!("No content (HTTP {})", response.status()).dimmed());
        return Ok(());
    }

    match response.json::<Value>() {
        Ok(value) if pretty => output::json_pretty(&value),
        Ok(value) => output::json(&value),
        Err(_) => {
            println!("{}", response.text());
            Ok(())
        }
    }
}

fn build(
    mut request: ApiRequest,
    args: QueryArgs,
    data: Option<String>,
) -> Result<(ApiRequest, bool)> {
    for (key, value) in args.query {
        request = request.query(key, value);
    }
    if let Some(data) = data {
        let body: Value = serde_json::from_str(&data).context("--data is not valid JSON")?;
        request = request.body(body);
    }
    Ok((request, args.pretty))
}

fn parse_key_value(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", raw))?;
    Ok((key.to_string(), value.to_string()))
}
