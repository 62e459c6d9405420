use crate::utils::constants::{CACHE_FILE_EXTENSION, GRANULE_EXTENSION};
use chrono::NaiveDate;
use std::path::Path;

/// Date stamp embedded in granule file names: `YYYYMMDD`
pub fn granule_date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Whether a granule file name carries the given date stamp,
/// e.g. `MERRA2_400.tavg1_2d_slv_Nx.20210315.json`
pub fn is_granule_for_date(file_name: &str, date: NaiveDate) -> bool {
    let stamp = format!(".{}.", granule_date_stamp(date));
    file_name.ends_with(&format!(".{}", GRANULE_EXTENSION)) && file_name.contains(&stamp)
}

pub fn cache_file_name(fingerprint: &str) -> String {
    format!("{}.{}", fingerprint, CACHE_FILE_EXTENSION)
}

pub fn is_cache_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map_or(false, |ext| ext == CACHE_FILE_EXTENSION)
}
