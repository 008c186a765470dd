// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tally - invoicing back-office with recurring WhatsApp dispatch.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod serve;
mod shutdown;
mod status;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tally_config::TallyConfig;

/// Tally - invoicing back-office with recurring WhatsApp dispatch.
#[derive(Parser, Debug)]
#[command(name = "tally", version, about, long_about = None)]
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
    /// Run the dispatch timer and HTTP gateway until interrupted.
    Serve,
    /// Show the scheduler state of a running `tally serve`.
    Status {
        /// Output machine-readable JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// List invoices due for a recurring send right now.
    Due {
        /// Output machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run one dispatch pass in the foreground.
    Dispatch,
    /// Print the effective configuration.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> TallyConfig {
    let loaded = match path {
        Some(path) => tally_config::load_and_validate_path(path),
        None => tally_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            tally_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => {
            serve::init_tracing(&config.app.log_level);
            serve::run_serve(config).await
        }
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Due { json }) => {
            serve::init_tracing("warn");
            commands::run_due(&config, json).await
        }
        Some(Commands::Dispatch) => {
            serve::init_tracing(&config.app.log_level);
            commands::run_dispatch(&config).await
        }
        Some(Commands::Config) => commands::run_config(&config),
        None => {
            println!("tally: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
