use crate::error::{EngineError, Result};
use crate::models::{BoundingBox, CellSelection, GridDataset, YearSampleBundle};
use crate::readers::sample_source::{Granule, Product, SampleSource};
use crate::utils::constants::{
    KELVIN_OFFSET, PRECIPITATION_CANDIDATES, VAR_EASTWARD_WIND_10M, VAR_NORTHWARD_WIND_10M,
    VAR_RELATIVE_HUMIDITY_2M, VAR_TEMPERATURE_2M,
};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One year's slice of a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearRequest {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub lat: f64,
    pub lon: f64,
    pub bbox: BoundingBox,
}

/// Pulls one year's samples out of a [`SampleSource`].
///
/// Failures are contained here: a file that cannot be decoded or a variable
/// that is missing only drops that sample, and an unreachable source only
/// empties the affected variable group.
#[derive(Clone)]
pub struct YearFetcher {
    source: Arc<dyn SampleSource>,
    retries: u32,
    retry_backoff: Duration,
}

impl YearFetcher {
    pub fn new(source: Arc<dyn SampleSource>) -> Self {
        Self {
            source,
            retries: 0,
            retry_backoff: Duration::ZERO,
        }
    }

    pub fn with_retries(mut self, retries: u32, retry_backoff: Duration) -> Self {
        self.retries = retries;
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn fetch(&self, request: &YearRequest) -> YearSampleBundle {
        let mut bundle = YearSampleBundle::default();

        let Some(date) = NaiveDate::from_ymd_opt(request.year, request.month, request.day) else {
            warn!(
                year = request.year,
                month = request.month,
                day = request.day,
                "Date does not exist in this year, skipping"
            );
            return bundle;
        };

        for product in [Product::SurfaceState, Product::SurfaceFlux] {
            match self.search_with_retry(product, &request.bbox, date) {
                Ok(granules) => self.read_granules(product, &granules, request, &mut bundle),
                Err(e) => warn!(
                    year = request.year,
                    product = %product,
                    lat = request.lat,
                    lon = request.lon,
                    error = %e,
                    "Source unavailable, variable group skipped"
                ),
            }
        }

        info!(
            year = request.year,
            temps = bundle.temperatures.len(),
            precip = bundle.precipitation_flux.len(),
            wind = bundle.wind_speeds.len(),
            humidity = bundle.humidity.len(),
            "Year fetched"
        );

        bundle
    }

    fn search_with_retry(
        &self,
        product: Product,
        bbox: &BoundingBox,
        date: NaiveDate,
    ) -> Result<Vec<Granule>> {
        let mut attempt = 0;
        loop {
            match self.source.search(product, bbox, date) {
                Ok(granules) => return Ok(granules),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    debug!(product = %product, %date, attempt, error = %e, "Retrying search");
                    if !self.retry_backoff.is_zero() {
                        std::thread::sleep(self.retry_backoff * attempt);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn read_granules(
        &self,
        product: Product,
        granules: &[Granule],
        request: &YearRequest,
        bundle: &mut YearSampleBundle,
    ) {
        for granule in granules {
            let dataset = match self.source.open(granule) {
                Ok(dataset) => dataset,
                Err(e) => {
                    warn!(
                        year = request.year,
                        product = %product,
                        granule = %granule.id,
                        error = %e,
                        "Could not open granule"
                    );
                    continue;
                }
            };

            let cell = match dataset.select(request.hour, request.lat, request.lon) {
                Ok(cell) => cell,
                Err(e) => {
                    warn!(
                        year = request.year,
                        granule = %granule.id,
                        error = %e,
                        "Could not select time step / grid cell"
                    );
                    continue;
                }
            };

            match product {
                Product::SurfaceState => extract_state(&dataset, cell, request, bundle),
                Product::SurfaceFlux => extract_flux(&dataset, cell, request, bundle),
            }
        }
    }
}

fn extract_state(
    dataset: &GridDataset,
    cell: CellSelection,
    request: &YearRequest,
    bundle: &mut YearSampleBundle,
) {
    if let Some(kelvin) = sample(dataset, VAR_TEMPERATURE_2M, cell, request) {
        bundle.temperatures.push(kelvin - KELVIN_OFFSET);
    }

    if dataset.has_variable(VAR_EASTWARD_WIND_10M) && dataset.has_variable(VAR_NORTHWARD_WIND_10M)
    {
        let u = sample(dataset, VAR_EASTWARD_WIND_10M, cell, request);
        let v = sample(dataset, VAR_NORTHWARD_WIND_10M, cell, request);
        if let (Some(u), Some(v)) = (u, v) {
            bundle.wind_speeds.push(u.hypot(v));
        }
    }

    if let Some(humidity) = sample(dataset, VAR_RELATIVE_HUMIDITY_2M, cell, request) {
        bundle.humidity.push(humidity);
    }
}

fn extract_flux(
    dataset: &GridDataset,
    cell: CellSelection,
    request: &YearRequest,
    bundle: &mut YearSampleBundle,
) {
    // first candidate present wins, even if its value turns out unusable
    match PRECIPITATION_CANDIDATES
        .iter()
        .find(|name| dataset.has_variable(name))
    {
        Some(name) => {
            if let Some(flux) = sample(dataset, name, cell, request) {
                bundle.precipitation_flux.push(flux);
            }
        }
        None => debug!(year = request.year, "No precipitation variable in granule"),
    }
}

fn sample(
    dataset: &GridDataset,
    variable: &str,
    cell: CellSelection,
    request: &YearRequest,
) -> Option<f64> {
    match dataset.value_at(variable, cell) {
        Ok(value) => Some(value),
        Err(EngineError::MissingVariable(_)) => {
            debug!(year = request.year, variable, "Variable absent");
            None
        }
        Err(e) => {
            warn!(
                year = request.year,
                variable,
                lat = request.lat,
                lon = request.lon,
                error = %e,
                "Sample dropped"
            );
            None
        }
    }
}
