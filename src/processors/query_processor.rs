use crate::error::Result;
use crate::models::{PooledSamples, Query, QueryResponse, RawQuery};
use crate::processors::{Aggregator, ProbabilityEngine};
use crate::readers::SampleSource;
use crate::settings::{EmptySeriesPolicy, LookbackWindow, Settings};
use crate::utils::progress::ProgressReporter;
use crate::writers::ResultCache;
use std::sync::Arc;
use tokio::task;
use tracing::{info, warn};

/// Answers one query end to end: validate, look up the cache, aggregate on a
/// miss, store, then summarize every requested condition.
pub struct QueryProcessor {
    aggregator: Aggregator,
    cache: Arc<ResultCache>,
    engine: ProbabilityEngine,
    window: LookbackWindow,
    empty_series: EmptySeriesPolicy,
}

impl QueryProcessor {
    pub fn new(source: Arc<dyn SampleSource>, cache: Arc<ResultCache>, settings: &Settings) -> Self {
        Self {
            aggregator: Aggregator::from_settings(source, &settings.fetch),
            cache,
            engine: ProbabilityEngine::new(settings.thresholds, settings.messages),
            window: settings.lookback.clone(),
            empty_series: settings.empty_series,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Validate an inbound record and answer it; malformed input is an error,
    /// missing data is not
    pub async fn evaluate(
        &self,
        raw: &RawQuery,
        progress: Option<&ProgressReporter>,
    ) -> Result<QueryResponse> {
        let query = Query::try_from(raw)?;

        info!(
            lat = query.latitude,
            lon = query.longitude,
            date = %query.date,
            hour = query.hour,
            conditions = ?query.conditions,
            "New query"
        );

        let pooled = self.pooled_samples(&query, progress).await;
        Ok(self.respond(&query, raw, &pooled))
    }

    /// Pooled samples for a query, from cache when possible
    pub async fn pooled_samples(
        &self,
        query: &Query,
        progress: Option<&ProgressReporter>,
    ) -> Arc<PooledSamples> {
        let fingerprint = query.fingerprint();

        let cache = self.cache.clone();
        let key = fingerprint.clone();
        match task::spawn_blocking(move || cache.get(&key)).await {
            Ok(Some(pooled)) => {
                info!(%fingerprint, "Using cached samples");
                return pooled;
            }
            Ok(None) => {}
            Err(e) => warn!(%fingerprint, error = %e, "Cache lookup aborted, recomputing"),
        }

        let pooled = Arc::new(self.aggregator.aggregate(query, &self.window, progress).await);

        let cache = self.cache.clone();
        let entry = pooled.clone();
        let key = fingerprint.clone();
        if let Err(e) = task::spawn_blocking(move || cache.put(&key, entry)).await {
            warn!(%fingerprint, error = %e, "Cache store aborted");
        }

        pooled
    }

    fn respond(&self, query: &Query, raw: &RawQuery, pooled: &PooledSamples) -> QueryResponse {
        let mut response = QueryResponse::new(query, &raw.date, &raw.time);
        let years_in_window = self.window.len();

        for kind in &query.conditions {
            let mut summary = self.engine.summarize(*kind, pooled, years_in_window);

            if !summary.is_available() && self.empty_series == EmptySeriesPolicy::SyntheticDefaults {
                summary = self.engine.synthetic_defaults(*kind, query.month());
                response.synthetic.push(*kind);
            }

            response.probabilities.insert(*kind, summary);
        }

        response
    }
}
