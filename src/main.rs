//! cvat-sync — one-shot synchronization of local image folders with
//! annotation tasks on a CVAT server.
//!
//! Each run polls the server's REST API for existing tasks, diffs them
//! against the immediate subdirectories of a local share, creates a task and
//! uploads images for every folder without a matching task, and optionally
//! archives completed tasks (download annotations, rename the local folder,
//! delete the remote task).

#![warn(clippy::all)]

mod cli;
mod config;
mod cvat;
mod logging;
mod sync;
mod types;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = config::Config::from_cli(cli)?;

    logging::init(&config.log_file, config.debug)?;

    // The Debug impl redacts the password.
    tracing::debug!("Program arguments: {:?}", config);

    if let Err(e) = sync::run(&config).await {
        tracing::error!("Error occurred");
        tracing::error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}
