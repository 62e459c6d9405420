/// Reanalysis collection short names
pub const SURFACE_STATE_SHORT_NAME: &str = "M2T1NXSLV";
pub const SURFACE_FLUX_SHORT_NAME: &str = "M2T1NXFLX";

/// Surface state variables
pub const VAR_TEMPERATURE_2M: &str = "T2M";
pub const VAR_EASTWARD_WIND_10M: &str = "U10M";
pub const VAR_NORTHWARD_WIND_10M: &str = "V10M";
pub const VAR_RELATIVE_HUMIDITY_2M: &str = "RH2M";

/// Precipitation variables, probed in order; the first one present wins
pub const PRECIPITATION_CANDIDATES: [&str; 4] = ["PRECTOTCORR", "PRECTOT", "PRECCON", "PRECSNO"];

/// Physical conversions
pub const KELVIN_OFFSET: f64 = 273.15;
pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Values at or above this magnitude are treated as fill values
pub const FILL_VALUE_FLOOR: f64 = 1.0e14;

/// Granule files
pub const GRANULE_EXTENSION: &str = "json";

/// Cache files
pub const CACHE_FILE_EXTENSION: &str = "json";

/// Lookback window defaults (inclusive)
pub const DEFAULT_START_YEAR: i32 = 2020;
pub const DEFAULT_END_YEAR: i32 = 2022;

/// Fetch defaults
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 5;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_FETCH_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
pub const DEFAULT_BBOX_DELTA: f64 = 0.5;

/// Condition thresholds
pub const RAIN_MM_PER_DAY: f64 = 1.0;
pub const EXTREME_RAIN_MM_PER_DAY: f64 = 20.0;
pub const HEAT_WAVE_CELSIUS: f64 = 30.0;
pub const COLD_CELSIUS: f64 = 3.0;
pub const HIGH_WIND_M_PER_S: f64 = 8.0;

/// Message bucket breakpoints
pub const LOW_UPPER_PERCENT: f64 = 20.0;
pub const MEDIUM_UPPER_PERCENT: f64 = 50.0;
pub const COLD_UPPER_CELSIUS: f64 = 15.0;
pub const MILD_UPPER_CELSIUS: f64 = 25.0;

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "CLIMATE_ODDS";
