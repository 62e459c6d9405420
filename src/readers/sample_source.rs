use crate::error::Result;
use crate::models::{BoundingBox, GridDataset};
use crate::utils::constants::{SURFACE_FLUX_SHORT_NAME, SURFACE_STATE_SHORT_NAME};
use chrono::NaiveDate;
use std::fmt;

/// Reanalysis collections the engine reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    /// Temperature, 10 m wind components, humidity
    SurfaceState,
    /// Precipitation
    SurfaceFlux,
}

impl Product {
    pub fn short_name(&self) -> &'static str {
        match self {
            Product::SurfaceState => SURFACE_STATE_SHORT_NAME,
            Product::SurfaceFlux => SURFACE_FLUX_SHORT_NAME,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Handle to one file returned by a catalog search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Granule {
    pub product: Product,
    pub id: String,
    /// Where `open` finds the file (path or URL, source specific)
    pub location: String,
}

/// Catalog search plus file decoding for the reanalysis collections.
///
/// Implementations are blocking and shared by every year fetch, so they
/// must be `Send + Sync`; session state such as credentials lives inside
/// the implementing value, constructed once by the host.
pub trait SampleSource: Send + Sync {
    /// Files of `product` covering `bbox` on `date` (inclusive, single day)
    fn search(&self, product: Product, bbox: &BoundingBox, date: NaiveDate)
        -> Result<Vec<Granule>>;

    /// Decode one file into a time/lat/lon grid
    fn open(&self, granule: &Granule) -> Result<GridDataset>;
}
