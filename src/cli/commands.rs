use crate::cli::args::{CacheAction, Cli, Commands, Overrides};
use crate::error::Result;
use crate::models::{CoordinateInput, QueryResponse, RawQuery};
use crate::processors::QueryProcessor;
use crate::readers::DirectorySource;
use crate::settings::Settings;
use crate::utils::progress::ProgressReporter;
use crate::writers::ResultCache;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Query {
            date,
            time,
            lat,
            lon,
            conditions,
            overrides,
        } => {
            let raw = RawQuery {
                date,
                time,
                lat: CoordinateInput::Text(lat),
                lon: CoordinateInput::Text(lon),
                conditions,
            };
            answer(&raw, settings, &overrides).await?;
        }

        Commands::Request { input, overrides } => {
            let raw = read_request(&input)?;
            answer(&raw, settings, &overrides).await?;
        }

        Commands::Cache { action, cache_dir } => {
            let dir = cache_dir.unwrap_or(settings.cache.dir);
            let cache = ResultCache::with_dir(&dir)?;

            match action {
                CacheAction::Info => {
                    println!("{}", cache.info()?.summary());
                }
                CacheAction::Clear => {
                    let removed = cache.clear()?;
                    println!("Removed {} cache entries from {}", removed, dir.display());
                }
            }
        }
    }

    Ok(())
}

async fn answer(raw: &RawQuery, settings: Settings, overrides: &Overrides) -> Result<()> {
    let settings = apply_overrides(settings, overrides)?;
    debug!(?settings, "Effective settings");

    let source = Arc::new(DirectorySource::new(&settings.source.root));
    let cache = if settings.cache.enabled {
        ResultCache::with_dir(&settings.cache.dir)?
    } else {
        ResultCache::in_memory()
    };

    let processor = QueryProcessor::new(source, Arc::new(cache), &settings);

    let progress = ProgressReporter::for_years(settings.lookback.len() as u64, overrides.quiet);
    let response = processor.evaluate(raw, Some(&progress)).await?;
    progress.finish_with_message("Done");

    print_response(&response, overrides.pretty)
}

fn apply_overrides(mut settings: Settings, overrides: &Overrides) -> Result<Settings> {
    if let Some(start_year) = overrides.start_year {
        settings.lookback.start_year = start_year;
    }
    if let Some(end_year) = overrides.end_year {
        settings.lookback.end_year = end_year;
    }
    if let Some(ref root) = overrides.source_root {
        settings.source.root = root.clone();
    }
    if let Some(ref dir) = overrides.cache_dir {
        settings.cache.dir = dir.clone();
    }
    if overrides.no_cache {
        settings.cache.enabled = false;
    }

    settings.validate()?;
    Ok(settings)
}

fn read_request(input: &Path) -> Result<RawQuery> {
    if input.as_os_str() == "-" {
        let stdin = std::io::stdin();
        return Ok(serde_json::from_reader(stdin.lock())?);
    }

    let file = File::open(input)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn print_response(response: &QueryResponse, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(response)?
    } else {
        serde_json::to_string(response)?
    };
    println!("{}", json);
    Ok(())
}
