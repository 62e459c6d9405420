pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod fingerprint;
pub mod progress;

pub use constants::*;
pub use coordinates::{nearest_index, parse_coordinate, validate_coordinates};
pub use filename::{cache_file_name, granule_date_stamp, is_granule_for_date};
pub use fingerprint::{fingerprint, format_coordinate};
pub use progress::ProgressReporter;

/// Round to one decimal place, halves to even (`6.25` becomes `6.2`)
pub fn round1(value: f64) -> f64 {
    let scaled = value * 10.0;
    let nearest = scaled.round();
    if (nearest - scaled).abs() == 0.5 {
        2.0 * (scaled / 2.0).round() / 10.0
    } else {
        nearest / 10.0
    }
}
