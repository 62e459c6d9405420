/// Cache key for a pooled aggregation.
///
/// The year is not part of the key: a query for 15 March reuses the pooled
/// samples whichever calendar year it was asked in.
///
/// # Examples
/// ```
/// use climate_odds::utils::fingerprint;
///
/// let a = fingerprint(40.4168, -3.7038, 3, 15, 14);
/// let b = fingerprint(40.4168, -3.7038, 3, 15, 14);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 32);
/// ```
pub fn fingerprint(lat: f64, lon: f64, month: u32, day: u32, hour: u32) -> String {
    let key = format!(
        "{}_{}_{}_{}_{}",
        format_coordinate(lat),
        format_coordinate(lon),
        month,
        day,
        hour
    );
    format!("{:x}", md5::compute(key.as_bytes()))
}

/// Shortest round-trip formatting, keeping a trailing `.0` on integral values
/// (`40.0`, `-3.7038`). Values below `1e-4` use a signed exponent of at least
/// two digits (`1e-05`), as existing cache keys do.
pub fn format_coordinate(value: f64) -> String {
    let repr = format!("{:?}", value);
    let Some((mantissa, exponent)) = repr.split_once('e') else {
        return repr;
    };

    match exponent.parse::<i32>() {
        Ok(exp) => format!(
            "{}e{}{:02}",
            mantissa,
            if exp < 0 { '-' } else { '+' },
            exp.unsigned_abs()
        ),
        Err(_) => repr,
    }
}
