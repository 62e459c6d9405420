use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "climate-odds")]
#[command(about = "Historical odds of rain, heat, cold and wind for a place, date and hour")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Settings file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate condition odds for one place, date and hour
    Query {
        #[arg(short, long, help = "Calendar date, YYYY-MM-DD")]
        date: String,

        #[arg(short, long, default_value = "12:00", help = "Time of day, HH:MM")]
        time: String,

        #[arg(long, allow_hyphen_values = true, help = "Latitude in decimal degrees")]
        lat: String,

        #[arg(long, allow_hyphen_values = true, help = "Longitude in decimal degrees")]
        lon: String,

        #[arg(
            long,
            value_delimiter = ',',
            default_value = "rain,temperature,extreme_rain,heat_wave,wind,cold",
            help = "Comma separated conditions"
        )]
        conditions: Vec<String>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Answer a JSON query record read from a file or stdin
    Request {
        #[arg(short, long, help = "Query record file, or '-' for stdin")]
        input: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Inspect or empty the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,

        #[arg(long, help = "Cache directory [default: from settings]")]
        cache_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show entry counts and size on disk
    Info,
    /// Delete every cached entry
    Clear,
}

/// Per-run settings overrides
#[derive(clap::Args, Debug, Default, Clone)]
pub struct Overrides {
    #[arg(long, help = "First year of the lookback window")]
    pub start_year: Option<i32>,

    #[arg(long, help = "Last year of the lookback window")]
    pub end_year: Option<i32>,

    #[arg(long, help = "Root of the local granule mirror")]
    pub source_root: Option<PathBuf>,

    #[arg(long, help = "Result cache directory")]
    pub cache_dir: Option<PathBuf>,

    #[arg(long, default_value = "false", help = "Do not read or write the result cache")]
    pub no_cache: bool,

    #[arg(long, default_value = "false", help = "Pretty-print the JSON result")]
    pub pretty: bool,

    #[arg(long, default_value = "false", help = "Hide the progress bar")]
    pub quiet: bool,
}
