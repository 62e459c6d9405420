use serde::{Deserialize, Serialize};

/// Scalar samples recovered for one year of the lookback window.
///
/// Each series is independent: a year may yield temperatures but no
/// precipitation without failing the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearSampleBundle {
    /// 2 m air temperature, °C
    pub temperatures: Vec<f64>,
    /// 10 m wind speed, m/s
    pub wind_speeds: Vec<f64>,
    /// 2 m relative humidity, %
    pub humidity: Vec<f64>,
    /// Surface precipitation flux, kg m-2 s-1
    pub precipitation_flux: Vec<f64>,
}

impl YearSampleBundle {
    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
            && self.wind_speeds.is_empty()
            && self.humidity.is_empty()
            && self.precipitation_flux.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.temperatures.len()
            + self.wind_speeds.len()
            + self.humidity.len()
            + self.precipitation_flux.len()
    }
}

/// Per-variable concatenation of every year's bundle for one fingerprint.
///
/// This is the cached unit; its JSON form keeps the flat
/// `temps`/`precip`/`wind`/`humidity` layout of the cache files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PooledSamples {
    #[serde(rename = "temps")]
    pub temperatures: Vec<f64>,

    #[serde(rename = "precip")]
    pub precipitation_flux: Vec<f64>,

    #[serde(rename = "wind")]
    pub wind_speeds: Vec<f64>,

    #[serde(default)]
    pub humidity: Vec<f64>,
}

impl PooledSamples {
    /// Fold one year's samples into the pool
    pub fn absorb(&mut self, bundle: YearSampleBundle) {
        self.temperatures.extend(bundle.temperatures);
        self.precipitation_flux.extend(bundle.precipitation_flux);
        self.wind_speeds.extend(bundle.wind_speeds);
        self.humidity.extend(bundle.humidity);
    }

    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
            && self.precipitation_flux.is_empty()
            && self.wind_speeds.is_empty()
            && self.humidity.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Temperatures: {}, Precipitation: {}, Wind: {}, Humidity: {}",
            self.temperatures.len(),
            self.precipitation_flux.len(),
            self.wind_speeds.len(),
            self.humidity.len()
        )
    }
}

impl FromIterator<YearSampleBundle> for PooledSamples {
    fn from_iter<I: IntoIterator<Item = YearSampleBundle>>(iter: I) -> Self {
        let mut pooled = PooledSamples::default();
        for bundle in iter {
            pooled.absorb(bundle);
        }
        pooled
    }
}
