pub mod directory_source;
pub mod sample_source;
pub mod year_fetcher;

pub use directory_source::DirectorySource;
pub use sample_source::{Granule, Product, SampleSource};
pub use year_fetcher::{YearFetcher, YearRequest};
