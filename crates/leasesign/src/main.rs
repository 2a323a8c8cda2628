// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leasesign - rental agreement e-signature webhook service.
//!
//! This is the binary entry point. Every subcommand drives the same
//! signature pipeline through a different transport.

mod commands;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use leasesign_config::LeasesignConfig;

/// Leasesign - rental agreement e-signature webhook service.
#[derive(Parser, Debug)]
#[command(name = "leasesign", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP webhook gateway.
    Serve,
    /// Process one webhook payload from a file or stdin and print the acknowledgment.
    Ingest {
        /// Payload file. Reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Re-run stored webhook events for one provider request.
    Replay {
        #[arg(long)]
        request_id: String,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// List stored webhook events.
    Events {
        #[arg(long)]
        request_id: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Validate configuration and exit.
    CheckConfig,
}

fn load_config(path: Option<&std::path::Path>) -> LeasesignConfig {
    let loaded = match path {
        Some(path) => leasesign_config::load_and_validate_path(path),
        None => leasesign_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            leasesign_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("leasesign={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Ingest { file }) => commands::run_ingest(config, file).await,
        Some(Commands::Replay { request_id, limit }) => {
            commands::run_replay(config, &request_id, limit).await
        }
        Some(Commands::Events { request_id, limit }) => {
            commands::run_events(config, request_id.as_deref(), limit).await
        }
        Some(Commands::CheckConfig) => {
            commands::print_config_summary(&config);
            Ok(())
        }
        None => {
            println!("leasesign: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
