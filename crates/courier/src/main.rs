// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - campaign message distribution with sender number rotation.
//!
//! This is the binary entry point. Every subcommand prints a JSON document
//! on stdout; logs go to stderr.

mod app;
mod commands;
mod contacts;
mod notify;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use courier_config::CourierConfig;
use courier_core::{CheckMode, CourierError};

use crate::app::App;

/// Courier - campaign message distribution with sender number rotation.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Configuration file, instead of the standard lookup paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Message content and platform selection shared by the send commands.
#[derive(Args, Debug)]
struct SendArgs {
    /// Campaign id.
    #[arg(long)]
    campaign: String,
    /// Message text. Defaults to the campaign's message.
    #[arg(long)]
    message: Option<String>,
    /// Platform token (telegram, whatsapp, waba, tgwa, tgwaba). Defaults to
    /// the campaign's priority.
    #[arg(long)]
    platform: Option<String>,
    /// Check mode for composite tokens. `one` for distribute, `both` for bulk.
    #[arg(long)]
    mode: Option<CheckMode>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a message to one recipient.
    Distribute {
        #[command(flatten)]
        send: SendArgs,
        /// Recipient phone number.
        #[arg(long)]
        to: String,
    },
    /// Send a message to every contact in a CSV file.
    Bulk {
        #[command(flatten)]
        send: SendArgs,
        /// CSV file with a phone column.
        #[arg(long)]
        contacts: PathBuf,
    },
    /// Show the sender number pool.
    Numbers,
    /// Reset daily counters and lift expired bans.
    ResetDaily,
    /// Activate a campaign.
    Activate {
        #[arg(long)]
        campaign: String,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => courier_config::load_and_validate_path(path),
        None => courier_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            courier_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    if let Commands::Config = cli.command {
        match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("courier: cannot render configuration: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    init_tracing(&config.service.log_level);

    match run(cli.command, &config).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("courier: cannot encode output: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("courier: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, config: &CourierConfig) -> Result<Value, CourierError> {
    let app = App::build(config).await?;
    let result = match command {
        Commands::Distribute { send, to } => {
            commands::distribute(
                &app,
                &send.campaign,
                &to,
                send.message.as_deref(),
                send.platform.as_deref(),
                send.mode.unwrap_or(CheckMode::One),
            )
            .await
        }
        Commands::Bulk { send, contacts } => {
            commands::bulk(
                &app,
                &send.campaign,
                &contacts,
                send.message.as_deref(),
                send.platform.as_deref(),
                send.mode.unwrap_or(CheckMode::Both),
            )
            .await
        }
        Commands::Numbers => commands::numbers(&app).await,
        Commands::ResetDaily => commands::reset_daily(&app).await,
        Commands::Activate { campaign } => commands::activate(&app, &campaign).await,
        Commands::Config => Ok(Value::Null),
    };
    app.shutdown().await?;
    result
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
