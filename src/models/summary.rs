use crate::models::query::{ConditionKind, Query};
use crate::utils::format_coordinate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-condition result; serialized as a flat object whose fields depend
/// on the variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConditionSummary {
    /// `rain` and `extreme_rain`
    Precipitation {
        probability: f64,
        #[serde(rename = "avgDays")]
        avg_days: f64,
        #[serde(rename = "maxRecorded")]
        max_recorded: f64,
        message: String,
    },
    Temperature {
        avg: f64,
        min: f64,
        max: f64,
        message: String,
    },
    HeatWave {
        probability: f64,
        #[serde(rename = "avgDays")]
        avg_days: f64,
        #[serde(rename = "maxTemp")]
        max_temp: f64,
        message: String,
    },
    Cold {
        probability: f64,
        #[serde(rename = "avgDays")]
        avg_days: f64,
        #[serde(rename = "minTemp")]
        min_temp: f64,
        message: String,
    },
    Wind {
        probability: f64,
        #[serde(rename = "avgSpeed")]
        avg_speed: f64,
        #[serde(rename = "maxSpeed")]
        max_speed: f64,
        message: String,
    },
    /// The backing series was empty
    Unavailable { error: String, message: String },
}

impl ConditionSummary {
    pub fn is_available(&self) -> bool {
        !matches!(self, ConditionSummary::Unavailable { .. })
    }

    /// Probability in percent, for the variants that carry one
    pub fn probability(&self) -> Option<f64> {
        match self {
            ConditionSummary::Precipitation { probability, .. }
            | ConditionSummary::HeatWave { probability, .. }
            | ConditionSummary::Cold { probability, .. }
            | ConditionSummary::Wind { probability, .. } => Some(*probability),
            ConditionSummary::Temperature { .. } | ConditionSummary::Unavailable { .. } => None,
        }
    }
}

/// Outbound record handed back to the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    /// `"lat, lon"`
    pub location: String,
    pub date: String,
    pub time: String,
    pub probabilities: BTreeMap<ConditionKind, ConditionSummary>,
    /// Conditions answered with synthetic defaults instead of measurements
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub synthetic: Vec<ConditionKind>,
}

impl QueryResponse {
    pub fn new(query: &Query, date: &str, time: &str) -> Self {
        Self {
            location: format!(
                "{}, {}",
                format_coordinate(query.latitude),
                format_coordinate(query.longitude)
            ),
            date: date.to_string(),
            time: time.to_string(),
            probabilities: BTreeMap::new(),
            synthetic: Vec::new(),
        }
    }
}
