// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flowlink - integration engine connecting business systems to partner APIs.
//!
//! This is the binary entry point: a worker server plus one-shot commands
//! for managing connections, running exchanges and inspecting tasks.

mod app;
mod commands;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use flowlink_config::FlowlinkConfig;
use flowlink_core::FlowlinkError;
use serde_json::Value;

use crate::app::App;
use crate::commands::CreateArgs;

/// Flowlink - integration engine for partner APIs.
#[derive(Parser, Debug)]
#[command(name = "flowlink", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the task worker pool until interrupted.
    Serve,
    /// Manage integration connections.
    Connections {
        #[command(subcommand)]
        action: ConnectionsCommand,
    },
    /// Check that a connection's partner is reachable.
    Ping { id: i64 },
    /// Run one sync exchange and print the partner's answer.
    Sync {
        id: i64,
        /// JSON payload handed to the connector.
        #[arg(long)]
        payload: Option<String>,
    },
    /// Queue a sync exchange with retries.
    Enqueue {
        id: i64,
        #[arg(long)]
        payload: Option<String>,
        /// Wait for the task to finish.
        #[arg(long)]
        wait: bool,
        /// Give up waiting after this many seconds.
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
    },
    /// Show the status of a queued task.
    Status { task_id: String },
    /// Revoke a queued or running task.
    Cancel { task_id: String },
    /// Show a connection's exchange logs, newest first.
    Logs {
        id: i64,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Simulated partner exchanges that never touch the network.
    Sandbox {
        #[command(subcommand)]
        action: SandboxCommand,
    },
    /// Show the signed request a webhook connection would send.
    WebhookPreview {
        /// Webhook connection settings as JSON.
        #[arg(long)]
        settings: Option<String>,
        #[arg(long)]
        payload: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConnectionsCommand {
    /// List all connections.
    List,
    /// Show one connection.
    Show { id: i64 },
    /// Create a connection.
    Create {
        name: String,
        /// Partner type, e.g. `accounting-odata` or `generic-webhook`.
        #[arg(long)]
        partner_type: String,
        #[arg(long)]
        description: Option<String>,
        /// Partner settings as JSON.
        #[arg(long)]
        settings: Option<String>,
        /// Create the connection disabled.
        #[arg(long)]
        disabled: bool,
    },
    /// Change name, description or settings.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        settings: Option<String>,
    },
    /// Allow syncs on a connection.
    Enable { id: i64 },
    /// Refuse syncs on a connection.
    Disable { id: i64 },
    /// Delete a connection and its logs.
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum SandboxCommand {
    /// List sandbox profiles.
    List,
    /// Simulate an exchange with one sandbox.
    Simulate {
        slug: String,
        #[arg(long)]
        payload: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Option<FlowlinkConfig> {
    let loaded = match path {
        Some(path) => flowlink_config::load_and_validate_path(path),
        None => flowlink_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => Some(config),
        Err(errors) => {
            flowlink_config::render_errors(&errors);
            None
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flowlink={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_ref()) else {
        return ExitCode::FAILURE;
    };
    init_tracing(&config.service.log_level);

    match run(cli.command, config).await {
        Ok(Some(output)) => {
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: FlowlinkConfig) -> Result<Option<Value>, FlowlinkError> {
    // Sandboxes need neither storage nor network.
    if let Commands::Sandbox { action } = &command {
        return match action {
            SandboxCommand::List => commands::sandbox_list(),
            SandboxCommand::Simulate { slug, payload } => {
                commands::sandbox_simulate(slug, payload.as_deref())
            }
        }
        .map(Some);
    }

    let app = App::open(config).await?;
    if let Commands::Serve = command {
        serve::run_serve(app).await?;
        return Ok(None);
    }

    let output = dispatch(&app, command).await;
    app.shutdown().await?;
    output.map(Some)
}

async fn dispatch(app: &App, command: Commands) -> Result<Value, FlowlinkError> {
    match command {
        Commands::Connections { action } => match action {
            ConnectionsCommand::List => commands::list_connections(app).await,
            ConnectionsCommand::Show { id } => commands::show_connection(app, id).await,
            ConnectionsCommand::Create {
                name,
                partner_type,
                description,
                settings,
                disabled,
            } => {
                commands::create_connection(
                    app,
                    CreateArgs {
                        name: &name,
                        partner_type: &partner_type,
                        description: description.as_deref(),
                        settings: settings.as_deref(),
                        disabled,
                    },
                )
                .await
            }
            ConnectionsCommand::Update {
                id,
                name,
                description,
                settings,
            } => {
                commands::update_connection(
                    app,
                    id,
                    name.as_deref(),
                    description.as_deref(),
                    settings.as_deref(),
                )
                .await
            }
            ConnectionsCommand::Enable { id } => commands::set_active(app, id, true).await,
            ConnectionsCommand::Disable { id } => commands::set_active(app, id, false).await,
            ConnectionsCommand::Delete { id } => commands::delete_connection(app, id).await,
        },
        Commands::Ping { id } => commands::ping(app, id).await,
        Commands::Sync { id, payload } => commands::sync(app, id, payload.as_deref()).await,
        Commands::Enqueue {
            id,
            payload,
            wait,
            timeout_secs,
        } => {
            let wait = wait.then(|| Duration::from_secs(timeout_secs));
            commands::enqueue(app, id, payload.as_deref(), wait).await
        }
        Commands::Status { task_id } => commands::task_status(app, &task_id).await,
        Commands::Cancel { task_id } => commands::cancel_task(app, &task_id).await,
        Commands::Logs { id, limit } => commands::logs(app, id, limit).await,
        Commands::WebhookPreview { settings, payload } => {
            commands::webhook_preview(app, settings.as_deref(), payload.as_deref())
        }
        Commands::Serve | Commands::Sandbox { .. } => Err(FlowlinkError::Internal(
            "command handled before dispatch".into(),
        )),
    }
}
