mod args;
mod config;

use std::process::ExitCode;

use args::Args;
use clap::Parser as _;
use room_climate::db::{RetryPolicy, Store};

use crate::config::load_associations;

// Exit 2 (missing required environment) is produced by the argument parser
// itself before run() is reached.
const EXIT_CONFIG_FAILURE: u8 = 3;
const EXIT_SYNC_FAILURE: u8 = 4;

const CONNECT_ATTEMPTS: u32 = 12;

#[tokio::main]
async fn main() -> ExitCode {
    room_climate::init_tracing();
    let args = Args::parse();

    if !args.config.exists() {
        tracing::warn!(
            path = %args.config.display(),
            "config file not found; no room associations will be synced"
        );
        return ExitCode::SUCCESS;
    }

    let entries = match load_associations(&args.config) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::error!(
                path = %args.config.display(),
                error = %err,
                "failed to load association config"
            );
            return ExitCode::from(EXIT_CONFIG_FAILURE);
        }
    };

    tracing::info!(
        path = %args.config.display(),
        count = entries.len(),
        "replacing room associations"
    );

    let mut store = Store::new(
        args.store.connect_options(),
        RetryPolicy::attempts(CONNECT_ATTEMPTS),
    );

    match store.replace_room_assocs(&entries).await {
        Ok(()) => {
            tracing::info!(count = entries.len(), "room association sync completed");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(
                error = %format!("{err:#}"),
                "room association sync failed; no changes were applied"
            );
            ExitCode::from(EXIT_SYNC_FAILURE)
        }
    }
}
