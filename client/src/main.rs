//! Main entry point for the `groupify` command-line client.
//!
//! This file initializes logging, loads configuration, restores the saved
//! login and hands the parsed subcommand to its handler. It also owns the
//! one place where errors are turned into text for the user.

mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod dashboard;
mod errors;
mod exports;
mod join;
mod prompt;
mod sessions;
#[cfg(test)]
mod test_support;

use crate::api::client::ApiClient;
use crate::auth::session::{AuthSession, FileTokenStore};
use crate::cli::Cli;
use crate::errors::ClientError;
use crate::prompt::Prompter;
use clap::Parser;
use config::Config;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ClientError>() {
                Some(client_error) => eprintln!("Error: {}", describe(client_error)),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let session = AuthSession::restore(store).await?;
    let client = ApiClient::new(&config, session.clone())?;
    let mut prompter = Prompter::new();

    tracing::debug!("Using API at {}", client.base_url());

    let result = commands::dispatch(cli.command, &config, &client, &mut prompter).await;

    // the redirect fires at most once per 401
    if session.take_login_redirect() {
        eprintln!("Your session has expired. Run `groupify login <email>` to sign in again.");
    }
    result
}

/// The text shown for a failed command. Transport details stay in the logs.
fn describe(error: &ClientError) -> String {
    match error {
        ClientError::Validation { message } => message.clone(),
        ClientError::Transport { source } => {
            tracing::debug!("Transport failure: {}", source);
            "Could not reach the server. Please try again.".to_string()
        }
        ClientError::Storage { message } => format!("Could not access the saved login: {message}"),
        other => other.user_message(GENERIC_FAILURE),
    }
}
