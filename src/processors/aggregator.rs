use crate::models::{PooledSamples, Query, YearSampleBundle};
use crate::readers::{SampleSource, YearFetcher, YearRequest};
use crate::settings::{FetchSettings, LookbackWindow};
use crate::utils::constants::{
    DEFAULT_BBOX_DELTA, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENT_FETCHES,
};
use crate::utils::progress::ProgressReporter;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Fans a query out over every year of the lookback window and pools the
/// samples that come back.
pub struct Aggregator {
    fetcher: YearFetcher,
    max_concurrent: usize,
    fetch_timeout: Duration,
    bbox_delta: f64,
}

impl Aggregator {
    pub fn new(source: Arc<dyn SampleSource>) -> Self {
        Self {
            fetcher: YearFetcher::new(source),
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            bbox_delta: DEFAULT_BBOX_DELTA,
        }
    }

    pub fn from_settings(source: Arc<dyn SampleSource>, settings: &FetchSettings) -> Self {
        Self::new(source)
            .with_max_concurrent(settings.max_concurrent)
            .with_fetch_timeout(settings.timeout())
            .with_retries(settings.retries, settings.retry_backoff())
            .with_bbox_delta(settings.bbox_delta)
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32, retry_backoff: Duration) -> Self {
        self.fetcher = self.fetcher.with_retries(retries, retry_backoff);
        self
    }

    pub fn with_bbox_delta(mut self, bbox_delta: f64) -> Self {
        self.bbox_delta = bbox_delta;
        self
    }

    /// Fetch every year of `window` with at most `max_concurrent` fetches in
    /// flight and pool the results.
    ///
    /// Waits for every year to finish. A year that fails, panics or times out
    /// contributes nothing; the others are still pooled, in ascending year
    /// order.
    pub async fn aggregate(
        &self,
        query: &Query,
        window: &LookbackWindow,
        progress: Option<&ProgressReporter>,
    ) -> PooledSamples {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let bbox = query.bounding_box(self.bbox_delta);
        let mut join_set = JoinSet::new();

        for year in window.years() {
            let request = YearRequest {
                year,
                month: query.month(),
                day: query.day(),
                hour: query.hour,
                lat: query.latitude,
                lon: query.longitude,
                bbox,
            };
            let fetcher = self.fetcher.clone();
            let semaphore = semaphore.clone();
            let fetch_timeout = self.fetch_timeout;

            join_set.spawn(async move {
                let bundle = fetch_bounded(fetcher, request, semaphore, fetch_timeout).await;
                (year, bundle)
            });
        }

        // Only this loop touches the pooled state
        let mut completed: BTreeMap<i32, YearSampleBundle> = BTreeMap::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((year, bundle)) => {
                    if let Some(p) = progress {
                        p.year_finished(year, bundle.sample_count());
                    }
                    completed.insert(year, bundle);
                }
                Err(e) => warn!(error = %e, "Year task did not complete"),
            }
        }

        let empty_years: Vec<i32> = completed
            .iter()
            .filter(|(_, bundle)| bundle.is_empty())
            .map(|(year, _)| *year)
            .collect();
        let pooled: PooledSamples = completed.into_values().collect();

        info!(
            lat = query.latitude,
            lon = query.longitude,
            years = window.len(),
            empty_years = ?empty_years,
            "Aggregated {}",
            pooled.summary()
        );

        pooled
    }
}

/// Run one year fetch on the blocking pool once a permit is free.
///
/// The permit travels with the blocking call, so a fetch that outlives its
/// timeout still counts against the limit until it really ends.
async fn fetch_bounded(
    fetcher: YearFetcher,
    request: YearRequest,
    semaphore: Arc<Semaphore>,
    fetch_timeout: Duration,
) -> YearSampleBundle {
    let year = request.year;
    let permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            warn!(year, error = %e, "Fetch limiter closed");
            return YearSampleBundle::default();
        }
    };

    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        fetcher.fetch(&request)
    });

    match tokio::time::timeout(fetch_timeout, handle).await {
        Ok(Ok(bundle)) => bundle,
        Ok(Err(e)) => {
            warn!(year, error = %e, "Year fetch aborted");
            YearSampleBundle::default()
        }
        Err(_) => {
            warn!(
                year,
                timeout_secs = fetch_timeout.as_secs_f64(),
                "Year fetch timed out"
            );
            YearSampleBundle::default()
        }
    }
}
