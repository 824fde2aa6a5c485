mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod session;
#[cfg(test)]
mod test_support;
mod workflow;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cmd::board::{self, ListArgs, StatusArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::console;
use crate::cmd::stats;
use crate::cmd::ticket::{self, SubmitArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::api::ApiClient;
use crate::session::Session;
use crate::workflow::submission::SubmissionReceipt;

#[derive(Parser)]
#[command(name = "deskflow", author, version, about = "Support ticket intake client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage CLI configuration.
    Config(ConfigArgs),
    #[command(flatten)]
    Backend(BackendCommand),
}

/// Commands that talk to the ticket backend.
#[derive(Subcommand)]
enum BackendCommand {
    /// Compose a ticket interactively with live category/priority suggestions.
    Draft,
    /// Submit a ticket in one shot.
    Submit(SubmitArgs),
    /// List tickets, optionally filtered.
    List(ListArgs),
    /// Move a ticket to another status.
    Status(StatusArgs),
    /// Show aggregate ticket statistics.
    Stats,
    /// Interactive session: browse, filter, triage and submit tickets.
    Console,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Config(args) => return config_cmd::run(args.command),
        Commands::Backend(command) => command,
    };

    let config = AppConfig::load()?;
    init_logging(&config.log_level);

    let session = Arc::new(Session::init(config.access_token.clone()));
    if !session.is_authenticated() {
        tracing::warn!("no access token configured; requests are sent unauthenticated");
    }

    let api = Arc::new(ApiClient::new(config.api_base_url.clone(), session.clone()));
    let context = AppContext::new(config, api.clone(), api);

    let result = dispatch(&context, command).await;
    session.teardown();
    result
}

async fn dispatch(ctx: &AppContext, command: BackendCommand) -> AppResult<()> {
    match command {
        BackendCommand::Draft => {
            let receipt = ticket::run_draft(ctx).await?;
            print_receipt(&receipt);
            Ok(())
        }
        BackendCommand::Submit(args) => {
            let receipt = ticket::run_submit(ctx, args).await?;
            print_receipt(&receipt);
            Ok(())
        }
        BackendCommand::List(args) => board::run_list(ctx, args).await,
        BackendCommand::Status(args) => board::run_status(ctx, args).await,
        BackendCommand::Stats => stats::run(ctx).await,
        BackendCommand::Console => console::run(ctx).await,
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_receipt(receipt: &SubmissionReceipt) {
    println!(
        "Ticket #{} created ({} / {}).",
        receipt.ticket.id, receipt.ticket.category, receipt.ticket.priority
    );
    println!("Response: {}", receipt.acknowledgment);
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use crate::domain::ticket::Status;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_and_backend_commands_parse_separately() {
        let cli = Cli::try_parse_from(["deskflow", "config", "show"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(_)));

        let cli = Cli::try_parse_from(["deskflow", "list", "--status", "in progress"]).unwrap();
        match cli.command {
            Commands::Backend(BackendCommand::List(args)) => {
                assert_eq!(args.status, Some(Status::InProgress))
            }
            _ => panic!("expected list command"),
        }
    }
}
