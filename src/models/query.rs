use crate::error::{EngineError, Result};
use crate::utils::{fingerprint, parse_coordinate, validate_coordinates};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Weather condition a caller can ask about.
///
/// Declaration order is the order conditions appear in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Rain,
    Temperature,
    ExtremeRain,
    HeatWave,
    Wind,
    Cold,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 6] = [
        ConditionKind::Rain,
        ConditionKind::Temperature,
        ConditionKind::ExtremeRain,
        ConditionKind::HeatWave,
        ConditionKind::Wind,
        ConditionKind::Cold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Rain => "rain",
            ConditionKind::Temperature => "temperature",
            ConditionKind::ExtremeRain => "extreme_rain",
            ConditionKind::HeatWave => "heat_wave",
            ConditionKind::Wind => "wind",
            ConditionKind::Cold => "cold",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase();
        ConditionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| EngineError::UnknownCondition(s.to_string()))
    }
}

/// A coordinate that may arrive as a JSON number or as numeric text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateInput {
    Number(f64),
    Text(String),
}

impl CoordinateInput {
    pub fn resolve(&self) -> Result<f64> {
        match self {
            CoordinateInput::Number(value) if value.is_finite() => Ok(*value),
            CoordinateInput::Number(value) => Err(EngineError::MalformedQuery(format!(
                "Coordinate must be a finite number, got: {}",
                value
            ))),
            CoordinateInput::Text(text) => parse_coordinate(text),
        }
    }
}

impl From<f64> for CoordinateInput {
    fn from(value: f64) -> Self {
        CoordinateInput::Number(value)
    }
}

/// Inbound query record as handed over by the HTTP layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuery {
    /// ISO calendar date, `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`; only the hour is used
    pub time: String,
    pub lat: CoordinateInput,
    pub lon: CoordinateInput,
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// A validated query
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Query {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub date: NaiveDate,

    #[validate(range(max = 23))]
    pub hour: u32,

    pub conditions: BTreeSet<ConditionKind>,
}

impl Query {
    pub fn new(
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
        hour: u32,
        conditions: impl IntoIterator<Item = ConditionKind>,
    ) -> Result<Self> {
        let query = Self {
            latitude,
            longitude,
            date,
            hour,
            conditions: conditions.into_iter().collect(),
        };
        query.check()?;
        Ok(query)
    }

    fn check(&self) -> Result<()> {
        validate_coordinates(self.latitude, self.longitude)?;
        if self.hour > 23 {
            return Err(EngineError::MalformedQuery(format!(
                "Hour must be between 0 and 23, got: {}",
                self.hour
            )));
        }
        if self.conditions.is_empty() {
            return Err(EngineError::MalformedQuery(
                "At least one condition is required".to_string(),
            ));
        }
        self.validate()?;
        Ok(())
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Cache key; independent of the query's calendar year
    pub fn fingerprint(&self) -> String {
        fingerprint(
            self.latitude,
            self.longitude,
            self.month(),
            self.day(),
            self.hour,
        )
    }

    pub fn bounding_box(&self, delta: f64) -> BoundingBox {
        BoundingBox::around(self.latitude, self.longitude, delta)
    }
}

impl TryFrom<&RawQuery> for Query {
    type Error = EngineError;

    fn try_from(raw: &RawQuery) -> Result<Self> {
        let date = NaiveDate::parse_from_str(raw.date.trim(), "%Y-%m-%d").map_err(|e| {
            EngineError::MalformedQuery(format!("Invalid date '{}': {}", raw.date, e))
        })?;
        let hour = parse_hour(&raw.time)?;
        let latitude = raw.lat.resolve()?;
        let longitude = raw.lon.resolve()?;

        let conditions = raw
            .conditions
            .iter()
            .map(|tag| tag.parse::<ConditionKind>())
            .collect::<Result<BTreeSet<_>>>()
            .map_err(|e| EngineError::MalformedQuery(e.to_string()))?;

        Query::new(latitude, longitude, date, hour, conditions)
    }
}

/// Hour from `HH`, `HH:MM` or `HH:MM:SS`
pub fn parse_hour(time: &str) -> Result<u32> {
    let head = time.trim().split(':').next().unwrap_or_default();
    let hour = head.parse::<u32>().map_err(|_| {
        EngineError::MalformedQuery(format!("Invalid time '{}': expected HH:MM", time))
    })?;

    if hour > 23 {
        return Err(EngineError::MalformedQuery(format!(
            "Hour must be between 0 and 23, got: {}",
            hour
        )));
    }

    Ok(hour)
}

/// Search region around a query point, in `(west, south, east, north)` order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn around(lat: f64, lon: f64, delta: f64) -> Self {
        Self {
            west: lon - delta,
            south: lat - delta,
            east: lon + delta,
            north: lat + delta,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}
