//! Runtime settings: lookback window, fetch limits, cache location, source
//! root, condition thresholds and message breakpoints.
//!
//! Layered as defaults, then an optional settings file, then environment
//! variables prefixed `CLIMATE_ODDS__` (e.g. `CLIMATE_ODDS__FETCH__MAX_CONCURRENT=3`).

use crate::error::Result;
use crate::utils::constants::*;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    #[validate(nested)]
    pub lookback: LookbackWindow,

    #[validate(nested)]
    pub fetch: FetchSettings,

    pub cache: CacheSettings,

    pub source: SourceSettings,

    pub thresholds: Thresholds,

    #[validate(nested)]
    pub messages: MessageBreakpoints,

    pub empty_series: EmptySeriesPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_window"))]
pub struct LookbackWindow {
    #[validate(range(min = 1980, max = 2100))]
    pub start_year: i32,

    #[validate(range(min = 1980, max = 2100))]
    pub end_year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FetchSettings {
    #[validate(range(min = 1, max = 64))]
    pub max_concurrent: usize,

    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    #[validate(range(max = 10))]
    pub retries: u32,

    pub retry_backoff_ms: u64,

    #[validate(range(exclusive_min = 0.0, max = 10.0))]
    pub bbox_delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub root: PathBuf,
}

/// Fixed thresholds that turn pooled samples into event counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub rain_mm_per_day: f64,
    pub extreme_rain_mm_per_day: f64,
    pub heat_wave_celsius: f64,
    pub cold_celsius: f64,
    pub high_wind_m_per_s: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_breakpoints"))]
pub struct MessageBreakpoints {
    pub low_upper: f64,
    pub medium_upper: f64,
    pub cold_upper_celsius: f64,
    pub mild_upper_celsius: f64,
}

/// What to report when a condition's backing series is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptySeriesPolicy {
    #[default]
    Unavailable,
    SyntheticDefaults,
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

impl LookbackWindow {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
        }
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Number of years attempted per query
    pub fn len(&self) -> usize {
        if self.end_year < self.start_year {
            0
        } else {
            (self.end_year - self.start_year + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LookbackWindow {
    fn default() -> Self {
        Self::new(DEFAULT_START_YEAR, DEFAULT_END_YEAR)
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            retries: DEFAULT_FETCH_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            bbox_delta: DEFAULT_BBOX_DELTA,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("cache"),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rain_mm_per_day: RAIN_MM_PER_DAY,
            extreme_rain_mm_per_day: EXTREME_RAIN_MM_PER_DAY,
            heat_wave_celsius: HEAT_WAVE_CELSIUS,
            cold_celsius: COLD_CELSIUS,
            high_wind_m_per_s: HIGH_WIND_M_PER_S,
        }
    }
}

impl Default for MessageBreakpoints {
    fn default() -> Self {
        Self {
            low_upper: LOW_UPPER_PERCENT,
            medium_upper: MEDIUM_UPPER_PERCENT,
            cold_upper_celsius: COLD_UPPER_CELSIUS,
            mild_upper_celsius: MILD_UPPER_CELSIUS,
        }
    }
}

fn validate_window(window: &LookbackWindow) -> std::result::Result<(), ValidationError> {
    if window.start_year > window.end_year {
        return Err(ValidationError::new("start_year_after_end_year"));
    }
    Ok(())
}

fn validate_breakpoints(
    breakpoints: &MessageBreakpoints,
) -> std::result::Result<(), ValidationError> {
    if breakpoints.low_upper > breakpoints.medium_upper
        || breakpoints.cold_upper_celsius > breakpoints.mild_upper_celsius
    {
        return Err(ValidationError::new("breakpoints_out_of_order"));
    }
    Ok(())
}
