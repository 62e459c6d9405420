use chrono::{Datelike, NaiveDate};
use climate_odds::error::{EngineError, Result};
use climate_odds::models::{
    BoundingBox, ConditionKind, ConditionSummary, CoordinateInput, GridDataset, Query, RawQuery,
};
use climate_odds::processors::{Aggregator, QueryProcessor};
use climate_odds::readers::{DirectorySource, Granule, Product, SampleSource};
use climate_odds::settings::{EmptySeriesPolicy, LookbackWindow, Settings};
use climate_odds::utils::round1;
use climate_odds::writers::ResultCache;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const LAT: f64 = 40.0;
const LON: f64 = -3.5;

/// One observation per product for a single year at the test cell
struct YearValues {
    year: i32,
    t2m_kelvin: f64,
    u10m: f64,
    v10m: f64,
    precip_flux: f64,
}

fn write_granule(
    root: &Path,
    short_name: &str,
    date: NaiveDate,
    lat_axis: &[f64],
    variables: serde_json::Value,
) {
    let dir = root.join(short_name);
    std::fs::create_dir_all(&dir).unwrap();

    let granule = json!({
        "time": [format!("{}T12:00:00", date)],
        "lat": lat_axis,
        "lon": [LON],
        "fill_value": 1.0e15,
        "variables": variables,
    });

    let file_name = format!("MERRA2_400.{}.{}.json", short_name, date.format("%Y%m%d"));
    std::fs::write(dir.join(file_name), granule.to_string()).unwrap();
}

fn write_mirror(root: &Path, years: &[YearValues]) {
    for values in years {
        let date = NaiveDate::from_ymd_opt(values.year, 7, 15).unwrap();
        write_granule(
            root,
            "M2T1NXSLV",
            date,
            &[LAT],
            json!({
                "T2M": [values.t2m_kelvin],
                "U10M": [values.u10m],
                "V10M": [values.v10m],
                "RH2M": [45.0],
            }),
        );
        write_granule(
            root,
            "M2T1NXFLX",
            date,
            &[LAT],
            json!({ "PRECTOTCORR": [values.precip_flux] }),
        );
    }
}

fn madrid_summer() -> Vec<YearValues> {
    vec![
        YearValues {
            year: 2020,
            t2m_kelvin: 308.15,
            u10m: 3.0,
            v10m: 4.0,
            precip_flux: 0.00002,
        },
        YearValues {
            year: 2021,
            t2m_kelvin: 301.15,
            u10m: 6.0,
            v10m: 8.0,
            precip_flux: 0.0,
        },
        YearValues {
            year: 2022,
            t2m_kelvin: 304.15,
            u10m: 0.0,
            v10m: 1.0,
            precip_flux: 0.0001,
        },
    ]
}

fn test_settings(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.lookback = LookbackWindow::new(2020, 2022);
    settings.fetch.retries = 0;
    settings.fetch.retry_backoff_ms = 0;
    settings.fetch.timeout_secs = 10;
    settings.source.root = root.to_path_buf();
    settings
}

fn raw_query(date: &str, conditions: &[&str]) -> RawQuery {
    RawQuery {
        date: date.to_string(),
        time: "12:00".to_string(),
        lat: CoordinateInput::Text("40.0".to_string()),
        lon: CoordinateInput::Number(LON),
        conditions: conditions.iter().map(|c| c.to_string()).collect(),
    }
}

fn all_conditions() -> Vec<&'static str> {
    ConditionKind::ALL.iter().map(|k| k.as_str()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_end_to_end_over_local_mirror() {
    let data_dir = TempDir::new().unwrap();
    write_mirror(data_dir.path(), &madrid_summer());

    let settings = test_settings(data_dir.path());
    let processor = QueryProcessor::new(
        Arc::new(DirectorySource::new(data_dir.path())),
        Arc::new(ResultCache::in_memory()),
        &settings,
    );

    let response = processor
        .evaluate(&raw_query("2024-07-15", &all_conditions()), None)
        .await
        .unwrap();

    assert_eq!(response.location, "40.0, -3.5");
    assert_eq!(response.date, "2024-07-15");
    assert_eq!(response.time, "12:00");
    assert!(response.synthetic.is_empty());

    let body = serde_json::to_value(&response).unwrap();
    let probabilities = &body["probabilities"];

    assert_eq!(probabilities["rain"]["probability"], json!(66.7));
    assert_eq!(probabilities["rain"]["avgDays"], json!(20.0));
    assert_eq!(probabilities["rain"]["maxRecorded"], json!(8.6));

    assert_eq!(probabilities["extreme_rain"]["probability"], json!(0.0));
    assert_eq!(probabilities["extreme_rain"]["avgDays"], json!(0.0));

    assert_eq!(probabilities["temperature"]["avg"], json!(31.3));
    assert_eq!(probabilities["temperature"]["min"], json!(28.0));
    assert_eq!(probabilities["temperature"]["max"], json!(35.0));

    assert_eq!(probabilities["heat_wave"]["probability"], json!(66.7));
    assert_eq!(probabilities["heat_wave"]["avgDays"], json!(20.0));
    assert_eq!(probabilities["heat_wave"]["maxTemp"], json!(35.0));

    assert_eq!(probabilities["cold"]["probability"], json!(0.0));
    assert_eq!(probabilities["cold"]["minTemp"], json!(28.0));

    assert_eq!(probabilities["wind"]["probability"], json!(33.3));
    assert_eq!(probabilities["wind"]["avgSpeed"], json!(5.3));
    assert_eq!(probabilities["wind"]["maxSpeed"], json!(10.0));

    assert!(body.get("synthetic").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cache_hit_ignores_query_year() {
    let data_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    write_mirror(data_dir.path(), &madrid_summer());

    let settings = test_settings(data_dir.path());
    let processor = QueryProcessor::new(
        Arc::new(DirectorySource::new(data_dir.path())),
        Arc::new(ResultCache::with_dir(cache_dir.path()).unwrap()),
        &settings,
    );

    let first = processor
        .evaluate(&raw_query("2024-07-15", &["heat_wave", "rain"]), None)
        .await
        .unwrap();

    // Without the mirror, only the cache can answer
    std::fs::remove_dir_all(data_dir.path().join("M2T1NXSLV")).unwrap();
    std::fs::remove_dir_all(data_dir.path().join("M2T1NXFLX")).unwrap();

    let second = processor
        .evaluate(&raw_query("1999-07-15", &["heat_wave", "rain"]), None)
        .await
        .unwrap();

    assert_eq!(first.probabilities, second.probabilities);
    assert_eq!(second.date, "1999-07-15");

    // A fresh process sees the persisted entry
    let restarted = QueryProcessor::new(
        Arc::new(DirectorySource::new(data_dir.path())),
        Arc::new(ResultCache::with_dir(cache_dir.path()).unwrap()),
        &settings,
    );
    let third = restarted
        .evaluate(&raw_query("2030-07-15", &["heat_wave", "rain"]), None)
        .await
        .unwrap();
    assert_eq!(first.probabilities, third.probabilities);
    assert_eq!(restarted.cache().info().unwrap().disk_entries, 1);
}

/// Years 2019 and 2021 fail in different ways; the rest report their own
/// year as a temperature in °C
struct FlakySource;

impl SampleSource for FlakySource {
    fn search(&self, product: Product, _bbox: &BoundingBox, date: NaiveDate) -> Result<Vec<Granule>> {
        match date.year() {
            2019 => Err(EngineError::SourceUnavailable {
                product: product.short_name().to_string(),
                date,
                message: "catalog down".to_string(),
            }),
            2021 => panic!("connection reset"),
            year => Ok(vec![Granule {
                product,
                id: date.to_string(),
                location: year.to_string(),
            }]),
        }
    }

    fn open(&self, granule: &Granule) -> Result<GridDataset> {
        let year: f64 = granule
            .location
            .parse()
            .map_err(|_| EngineError::Decode(granule.location.clone()))?;
        let variable = match granule.product {
            Product::SurfaceState => "T2M",
            Product::SurfaceFlux => "PRECTOT",
        };
        let value = match granule.product {
            Product::SurfaceState => year - 2000.0 + 273.15,
            Product::SurfaceFlux => 0.0,
        };

        Ok(GridDataset {
            time: vec![NaiveDate::from_ymd_opt(2000, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()],
            lat: vec![LAT],
            lon: vec![LON],
            fill_value: None,
            variables: HashMap::from([(variable.to_string(), vec![value])]),
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_years_are_skipped() {
    let aggregator = Aggregator::new(Arc::new(FlakySource))
        .with_max_concurrent(2)
        .with_retries(0, Duration::ZERO);
    let query = Query::new(
        LAT,
        LON,
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        12,
        [ConditionKind::Temperature],
    )
    .unwrap();

    let pooled = aggregator
        .aggregate(&query, &LookbackWindow::new(2018, 2022), None)
        .await;

    let temps: Vec<i64> = pooled
        .temperatures
        .iter()
        .map(|t| t.round() as i64)
        .collect();
    assert_eq!(temps, vec![18, 20, 22]);
    assert_eq!(pooled.precipitation_flux, vec![0.0, 0.0, 0.0]);
    assert!(pooled.wind_speeds.is_empty());
}

/// Counts searches so concurrent queries can be checked for consistency
struct CountingSource {
    inner: DirectorySource,
    searches: AtomicUsize,
}

impl SampleSource for CountingSource {
    fn search(&self, product: Product, bbox: &BoundingBox, date: NaiveDate) -> Result<Vec<Granule>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        self.inner.search(product, bbox, date)
    }

    fn open(&self, granule: &Granule) -> Result<GridDataset> {
        self.inner.open(granule)
    }
}

const NORTH_LAT: f64 = 41.0;

/// A two-cell mirror: the `LAT` row holds `madrid_summer` values, the
/// `NORTH_LAT` row a colder, windier series
fn write_two_cell_mirror(root: &Path) {
    let north = [(2020, 283.15, 2.0, 0.0), (2021, 293.15, 9.0, 0.0), (2022, 278.15, 12.0, 0.0)];

    for (south, (year, t2m, v10m, flux)) in madrid_summer().iter().zip(north) {
        assert_eq!(south.year, year);
        let date = NaiveDate::from_ymd_opt(year, 7, 15).unwrap();
        write_granule(
            root,
            "M2T1NXSLV",
            date,
            &[LAT, NORTH_LAT],
            json!({
                "T2M": [south.t2m_kelvin, t2m],
                "U10M": [south.u10m, 0.0],
                "V10M": [south.v10m, v10m],
            }),
        );
        write_granule(
            root,
            "M2T1NXFLX",
            date,
            &[LAT, NORTH_LAT],
            json!({ "PRECTOTCORR": [south.precip_flux, flux] }),
        );
    }
}

fn rounded(series: &[f64]) -> Vec<f64> {
    series.iter().map(|v| round1(*v)).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_on_two_locations() {
    let data_dir = TempDir::new().unwrap();
    write_two_cell_mirror(data_dir.path());

    let source = Arc::new(CountingSource {
        inner: DirectorySource::new(data_dir.path()),
        searches: AtomicUsize::new(0),
    });
    let settings = test_settings(data_dir.path());
    let processor = Arc::new(QueryProcessor::new(
        source.clone(),
        Arc::new(ResultCache::in_memory()),
        &settings,
    ));

    let mut handles = Vec::new();
    for i in 0..16 {
        let processor = processor.clone();
        let mut raw = raw_query("2024-07-15", &["temperature", "wind", "rain"]);
        if i % 2 == 1 {
            raw.lat = CoordinateInput::Number(NORTH_LAT);
        }
        handles.push(tokio::spawn(async move { processor.evaluate(&raw, None).await }));
    }

    let mut by_location: HashMap<String, Vec<_>> = HashMap::new();
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        by_location
            .entry(response.location.clone())
            .or_default()
            .push(response.probabilities);
    }

    assert_eq!(by_location.len(), 2);

    let south = &by_location["40.0, -3.5"];
    assert_eq!(south.len(), 8);
    for probabilities in south {
        assert_eq!(
            probabilities[&ConditionKind::Temperature],
            ConditionSummary::Temperature {
                avg: 31.3,
                min: 28.0,
                max: 35.0,
                message: "Warm weather, ideal for enjoying the outdoors".to_string(),
            }
        );
        assert_eq!(probabilities[&ConditionKind::Wind].probability(), Some(33.3));
        assert_eq!(probabilities[&ConditionKind::Rain].probability(), Some(66.7));
    }

    let north = &by_location["41.0, -3.5"];
    assert_eq!(north.len(), 8);
    for probabilities in north {
        match &probabilities[&ConditionKind::Temperature] {
            ConditionSummary::Temperature { avg, min, max, .. } => {
                assert_eq!((*avg, *min, *max), (11.7, 5.0, 20.0));
            }
            other => panic!("unexpected summary: {:?}", other),
        }
        match &probabilities[&ConditionKind::Wind] {
            ConditionSummary::Wind {
                probability,
                avg_speed,
                max_speed,
                ..
            } => assert_eq!((*probability, *avg_speed, *max_speed), (66.7, 7.7, 12.0)),
            other => panic!("unexpected summary: {:?}", other),
        }
        assert_eq!(probabilities[&ConditionKind::Rain].probability(), Some(0.0));
    }

    // Each pool holds exactly one sample per year, in year order
    let date = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
    let south_query = Query::new(LAT, LON, date, 12, [ConditionKind::Temperature]).unwrap();
    let north_query = Query::new(NORTH_LAT, LON, date, 12, [ConditionKind::Temperature]).unwrap();

    let before = source.searches.load(Ordering::SeqCst);
    let south_pool = processor.pooled_samples(&south_query, None).await;
    let north_pool = processor.pooled_samples(&north_query, None).await;
    assert_eq!(source.searches.load(Ordering::SeqCst), before);

    assert_eq!(rounded(&south_pool.temperatures), vec![35.0, 28.0, 31.0]);
    assert_eq!(rounded(&south_pool.wind_speeds), vec![5.0, 10.0, 1.0]);
    assert_eq!(south_pool.precipitation_flux, vec![0.00002, 0.0, 0.0001]);

    assert_eq!(rounded(&north_pool.temperatures), vec![10.0, 20.0, 5.0]);
    assert_eq!(rounded(&north_pool.wind_speeds), vec![2.0, 9.0, 12.0]);
    assert_eq!(north_pool.precipitation_flux, vec![0.0, 0.0, 0.0]);
    assert!(north_pool.humidity.is_empty());
}

#[tokio::test]
async fn test_empty_series_policies() {
    let data_dir = TempDir::new().unwrap();
    let mut settings = test_settings(data_dir.path());

    let processor = QueryProcessor::new(
        Arc::new(DirectorySource::new(data_dir.path())),
        Arc::new(ResultCache::in_memory()),
        &settings,
    );
    let response = processor
        .evaluate(&raw_query("2024-10-02", &["rain", "temperature"]), None)
        .await
        .unwrap();

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(
        body["probabilities"]["rain"]["error"],
        json!("No historical data available")
    );
    assert!(!response.probabilities[&ConditionKind::Temperature].is_available());
    assert!(response.synthetic.is_empty());

    settings.empty_series = EmptySeriesPolicy::SyntheticDefaults;
    let processor = QueryProcessor::new(
        Arc::new(DirectorySource::new(data_dir.path())),
        Arc::new(ResultCache::in_memory()),
        &settings,
    );
    let response = processor
        .evaluate(&raw_query("2024-10-02", &["rain", "temperature"]), None)
        .await
        .unwrap();

    assert_eq!(
        response.synthetic,
        vec![ConditionKind::Rain, ConditionKind::Temperature]
    );
    assert!(response.probabilities.values().all(|s| s.is_available()));

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["synthetic"], json!(["rain", "temperature"]));
    assert_eq!(body["probabilities"]["temperature"]["avg"], json!(19.0));
}

#[tokio::test]
async fn test_malformed_queries_are_rejected() {
    let data_dir = TempDir::new().unwrap();
    let settings = test_settings(data_dir.path());
    let processor = QueryProcessor::new(
        Arc::new(DirectorySource::new(data_dir.path())),
        Arc::new(ResultCache::in_memory()),
        &settings,
    );

    let mut bad_lat = raw_query("2024-07-15", &["rain"]);
    bad_lat.lat = CoordinateInput::Text("forty".to_string());

    let mut out_of_range = raw_query("2024-07-15", &["rain"]);
    out_of_range.lat = CoordinateInput::Number(91.0);

    let bad_date = raw_query("2024-02-30", &["rain"]);
    let unknown_condition = raw_query("2024-07-15", &["snow"]);
    let no_conditions = raw_query("2024-07-15", &[]);

    let mut bad_time = raw_query("2024-07-15", &["rain"]);
    bad_time.time = "25:00".to_string();

    for raw in [
        bad_lat,
        out_of_range,
        bad_date,
        unknown_condition,
        no_conditions,
        bad_time,
    ] {
        let result = processor.evaluate(&raw, None).await;
        assert!(
            matches!(result, Err(EngineError::MalformedQuery(_))),
            "expected a malformed query error for {:?}, got {:?}",
            raw,
            result
        );
    }

    assert_eq!(processor.cache().info().unwrap().memory_entries, 0);
}
