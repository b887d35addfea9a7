//! CLI for kfetch: no arguments, one line of output.

use anyhow::{Context, Result};
use clap::Parser;
use kfetch_core::config;
use kfetch_core::{DatasetFetcher, DatasetHandle, Fetch};
use std::io::{self, Write};
use std::path::Path;

/// Prefix of the single line printed on success.
pub const RESULT_PREFIX: &str = "Path to dataset files: ";

/// Download the configured dataset into the current directory and print where it landed.
#[derive(Debug, Parser)]
#[command(name = "kfetch", version)]
#[command(about = "Download a dataset into the current directory and print its local path", long_about = None)]
pub struct Cli {}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let _cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let handle = DatasetHandle::parse(&cfg.handle)?;
        let destination_hint =
            std::env::current_dir().context("cannot resolve current directory")?;
        let fetcher = DatasetFetcher::from_config(&cfg)?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        fetch_and_report(&fetcher, &handle, &destination_hint, &mut out)
    }
}

/// Fetch `handle` and write the result line to `out`.
///
/// The printed path is exactly what the fetcher returned. On failure nothing
/// is written.
pub fn fetch_and_report<F, W>(
    fetcher: &F,
    handle: &DatasetHandle,
    destination_hint: &Path,
    out: &mut W,
) -> Result<()>
where
    F: Fetch,
    W: Write,
{
    tracing::info!("fetching {} into {}", handle, destination_hint.display());
    let path = fetcher
        .fetch(handle, destination_hint)
        .with_context(|| format!("failed to fetch dataset {}", handle))?;
    writeln!(out, "{}{}", RESULT_PREFIX, path.display())?;
    out.flush()?;
    Ok(())
}
