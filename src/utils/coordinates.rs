use crate::error::{EngineError, Result};

/// Parse a decimal-degree coordinate that arrived as text
///
/// # Examples
/// ```
/// use climate_odds::utils::parse_coordinate;
///
/// let lat = parse_coordinate(" 40.4168 ").unwrap();
/// assert!((lat - 40.4168).abs() < 1e-9);
/// ```
pub fn parse_coordinate(coord_str: &str) -> Result<f64> {
    let trimmed = coord_str.trim();
    let value = trimmed.parse::<f64>().map_err(|_| {
        EngineError::MalformedQuery(format!("Invalid coordinate value: '{}'", coord_str))
    })?;

    if !value.is_finite() {
        return Err(EngineError::MalformedQuery(format!(
            "Coordinate must be a finite number, got: '{}'",
            coord_str
        )));
    }

    Ok(value)
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(EngineError::MalformedQuery(format!(
            "Latitude {} is outside [-90, 90]",
            latitude
        )));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(EngineError::MalformedQuery(format!(
            "Longitude {} is outside [-180, 180]",
            longitude
        )));
    }

    Ok(())
}

/// Index of the axis value closest to `target`; the lower index wins a tie
pub fn nearest_index(axis: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (i, value) in axis.iter().enumerate() {
        let distance = (value - target).abs();
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((i, distance)),
        }
    }

    best.map(|(i, _)| i)
}
