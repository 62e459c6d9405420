use crate::error::{EngineError, Result};
use crate::models::{BoundingBox, GridDataset};
use crate::readers::sample_source::{Granule, Product, SampleSource};
use crate::utils::filename::is_granule_for_date;
use chrono::NaiveDate;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::debug;

/// Reads granules from a local mirror laid out as
/// `<root>/<SHORT_NAME>/<name>.<YYYYMMDD>.json`.
///
/// Mirrored granules are global grids, so the bounding box only narrows the
/// later nearest-neighbour lookup, not the file search.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn product_dir(&self, product: Product) -> PathBuf {
        self.root.join(product.short_name())
    }
}

impl SampleSource for DirectorySource {
    fn search(
        &self,
        product: Product,
        bbox: &BoundingBox,
        date: NaiveDate,
    ) -> Result<Vec<Granule>> {
        let dir = self.product_dir(product);
        let entries = std::fs::read_dir(&dir).map_err(|e| EngineError::SourceUnavailable {
            product: product.short_name().to_string(),
            date,
            message: format!("cannot list {}: {}", dir.display(), e),
        })?;

        let mut granules = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                if is_granule_for_date(file_name, date) {
                    granules.push(Granule {
                        product,
                        id: file_name.to_string(),
                        location: path.to_string_lossy().into_owned(),
                    });
                }
            }
        }

        // read_dir order is platform dependent
        granules.sort_by(|a, b| a.id.cmp(&b.id));

        debug!(
            product = %product,
            %date,
            bbox = %bbox,
            found = granules.len(),
            "Searched local mirror"
        );

        Ok(granules)
    }

    fn open(&self, granule: &Granule) -> Result<GridDataset> {
        let file = File::open(&granule.location)?;
        let dataset: GridDataset = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| EngineError::Decode(format!("{}: {}", granule.id, e)))?;
        dataset.validate_shape()?;
        Ok(dataset)
    }
}
