use crate::error::{EngineError, Result};
use crate::utils::constants::FILL_VALUE_FLOOR;
use crate::utils::nearest_index;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One decoded granule: named variables over a `time × lat × lon` grid.
///
/// Variable values are stored flat in `[time][lat][lon]` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDataset {
    pub time: Vec<NaiveDateTime>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    #[serde(default)]
    pub fill_value: Option<f64>,
    pub variables: HashMap<String, Vec<f64>>,
}

/// A single grid cell at a single time step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSelection {
    pub time_index: usize,
    pub lat_index: usize,
    pub lon_index: usize,
}

impl GridDataset {
    /// Check that every variable matches the grid dimensions
    pub fn validate_shape(&self) -> Result<()> {
        if self.lat.is_empty() || self.lon.is_empty() {
            return Err(EngineError::Decode(
                "grid has an empty latitude or longitude axis".to_string(),
            ));
        }

        let expected = self.cell_count();
        for (name, values) in &self.variables {
            if values.len() != expected {
                return Err(EngineError::Decode(format!(
                    "variable '{}' has {} values, expected {} ({}x{}x{})",
                    name,
                    values.len(),
                    expected,
                    self.time.len(),
                    self.lat.len(),
                    self.lon.len()
                )));
            }
        }

        Ok(())
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Time step whose hour-of-day is closest to `target_hour`.
    ///
    /// A single time step is used as-is; ties go to the earliest index.
    pub fn nearest_time_index(&self, target_hour: u32) -> Result<usize> {
        match self.time.len() {
            0 => Err(EngineError::Decode("dataset has no time steps".to_string())),
            1 => Ok(0),
            _ => {
                let mut best = 0;
                let mut best_distance = u32::MAX;
                for (i, timestamp) in self.time.iter().enumerate() {
                    let distance = timestamp.hour().abs_diff(target_hour);
                    if distance < best_distance {
                        best = i;
                        best_distance = distance;
                    }
                }
                Ok(best)
            }
        }
    }

    /// Nearest time step and nearest grid cell for a query point
    pub fn select(&self, target_hour: u32, lat: f64, lon: f64) -> Result<CellSelection> {
        let time_index = self.nearest_time_index(target_hour)?;
        let lat_index = nearest_index(&self.lat, lat)
            .ok_or_else(|| EngineError::Decode("latitude axis is empty".to_string()))?;
        let lon_index = nearest_index(&self.lon, lon)
            .ok_or_else(|| EngineError::Decode("longitude axis is empty".to_string()))?;

        Ok(CellSelection {
            time_index,
            lat_index,
            lon_index,
        })
    }

    /// Value of `variable` at a selected cell; fill values and non-finite
    /// numbers are reported as missing
    pub fn value_at(&self, variable: &str, cell: CellSelection) -> Result<f64> {
        let values = self
            .variables
            .get(variable)
            .ok_or_else(|| EngineError::MissingVariable(variable.to_string()))?;

        let offset = (cell.time_index * self.lat.len() + cell.lat_index) * self.lon.len()
            + cell.lon_index;
        let value = *values.get(offset).ok_or_else(|| {
            EngineError::Decode(format!(
                "offset {} out of bounds for variable '{}' ({} values)",
                offset,
                variable,
                values.len()
            ))
        })?;

        if self.is_fill(value) {
            return Err(EngineError::MissingValue {
                variable: variable.to_string(),
            });
        }

        Ok(value)
    }

    fn cell_count(&self) -> usize {
        self.time.len() * self.lat.len() * self.lon.len()
    }

    fn is_fill(&self, value: f64) -> bool {
        !value.is_finite()
            || value.abs() >= FILL_VALUE_FLOOR
            || self.fill_value.map_or(false, |fill| value == fill)
    }
}
