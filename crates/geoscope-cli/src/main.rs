//! GeoScope CLI - command-line client for the GeoScope API

mod cli;
mod client;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use client::ClientError;
use output::OutputWriter;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);

    let result = tokio::runtime::Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(commands::execute(cli, &output)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let details = err.downcast_ref::<ClientError>().and_then(ClientError::details);
            output.error(format!("{:#}", err), details);
            ExitCode::FAILURE
        }
    }
}
