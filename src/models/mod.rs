pub mod grid;
pub mod query;
pub mod samples;
pub mod summary;

pub use grid::{CellSelection, GridDataset};
pub use query::{parse_hour, BoundingBox, ConditionKind, CoordinateInput, Query, RawQuery};
pub use samples::{PooledSamples, YearSampleBundle};
pub use summary::{ConditionSummary, QueryResponse};
