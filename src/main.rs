use anyhow::Context;
use clap::Parser;
use climate_odds::cli::{run, Cli};
use std::fs::File;
use std::sync::Mutex;
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    run(cli).await?;
    Ok(())
}

/// Logs go to stderr (or a file) so stdout carries only the JSON result
fn init_logging(verbose: bool, log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}
