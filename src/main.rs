mod app;
mod closure;
mod config;
mod document;
mod dsl;
mod elements;
mod error;
mod ingest;
mod metadata;
mod query;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

use app::Cli;
use error::QueryError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match try_main(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Request errors carry their own status; everything else is internal.
            match err.downcast_ref::<QueryError>() {
                Some(query_err) => eprintln!("{} {}", query_err.status(), query_err),
                None => eprintln!("500 {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: &Cli) -> Result<()> {
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("CLI: Failed to initialize thread pool")?;
    }

    let start = std::time::Instant::now();
    app::run(cli)?;
    tracing::info!("Done in {:.2?}", start.elapsed());
    Ok(())
}
