// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dird: user executable for the directord platform.

mod cli;
mod client_conn;
mod commands;
mod config;
mod exit_error;
mod output;

use clap::Parser;
use cli::{Cli, Command};
use config::{FileConfig, Settings};
use exit_error::{ExitError, EXIT_UNSUPPORTED_PLATFORM};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if !cfg!(unix) {
        eprintln!("directord requires a UNIX platform");
        std::process::exit(EXIT_UNSUPPORTED_PLATFORM);
    }

    let args = Cli::parse();
    init_tracing(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(e.code);
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(args: Cli) -> Result<(), ExitError> {
    let file = FileConfig::load(args.config.as_deref())?;
    let settings = Settings::resolve(&args, file);

    match args.command {
        Command::Server => commands::server::run(&settings).await,
        Command::Client => commands::client::run(&settings).await,
        Command::Exec { verb, args: arg_line, targets, wait } => {
            commands::exec::run(&settings, verb, arg_line, targets, wait).await
        }
        Command::Orchestrate { files, targets, restrict, ignore_cache, wait, vars } => {
            commands::orchestrate::run(
                &settings,
                commands::orchestrate::OrchestrateParams {
                    files,
                    targets,
                    restrict,
                    ignore_cache,
                    wait,
                    vars,
                },
            )
            .await
        }
        Command::Bootstrap { catalogs, thread } => {
            commands::bootstrap::run(&settings, catalogs, thread).await
        }
        Command::Manage(manage_args) => commands::manage::run(&settings, manage_args).await,
    }
}
