use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;

use hangqing_core::{
    DailySeries, DataSource, DateRange, HangqingError, OrderingPolicy, StockCode, normalize,
};

use crate::core::Hangqing;

impl Hangqing {
    /// Fetch a canonical daily series for `symbol` over `range`.
    ///
    /// With `use_cache`, a matching cache entry is returned without touching
    /// any source, and a freshly fetched series is written back before
    /// returning. On a miss (or `use_cache = false`) the fallback
    /// orchestrator tries each enabled, available source in order with
    /// bounded, jittered retries and returns the first usable result.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a malformed symbol. Under the default
    /// configuration the only fetch error that surfaces is
    /// `AllSourcesExhausted`; with `auto_fallback` disabled, the first
    /// source's final error propagates instead.
    pub async fn fetch_stock_data(
        &self,
        symbol: &str,
        range: &DateRange,
        use_cache: bool,
    ) -> Result<DailySeries, HangqingError> {
        let code = StockCode::parse(symbol)?;

        if use_cache {
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.load_stock(&code, range) {
                    tracing::debug!(symbol = %code, rows = hit.len(), "cache hit");
                    return Ok(hit);
                }
            }
        }

        let series = self.fetch_with_fallback(&code, range).await?;

        if use_cache {
            if let Some(cache) = &self.cache {
                cache.save_stock(&code, range, &series);
            }
        }
        Ok(series)
    }

    /// Try each candidate source in order until one yields a usable series.
    async fn fetch_with_fallback(
        &self,
        code: &StockCode,
        range: &DateRange,
    ) -> Result<DailySeries, HangqingError> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(HangqingError::unsupported("daily history"));
        }

        tracing::info!(
            symbol = %code,
            start = %range.start_dashed(),
            end = %range.end_dashed(),
            "fetching daily history"
        );

        let mut failures: Vec<HangqingError> = Vec::new();
        for source in candidates {
            match self.try_source(&source, code, range).await {
                Ok(series) => {
                    self.stats.record_success(source.name());
                    tracing::info!(source = source.name(), rows = series.len(), "fetch succeeded");
                    return Ok(series);
                }
                Err(err) => {
                    tracing::warn!(source = source.name(), %err, "source exhausted");
                    if !self.cfg.auto_fallback {
                        return Err(err);
                    }
                    failures.push(err);
                }
            }
        }

        Err(HangqingError::AllSourcesExhausted {
            symbol: code.to_string(),
            start: range.start(),
            end: range.end(),
            errors: failures,
        })
    }

    /// Run one source through its attempt budget.
    async fn try_source(
        &self,
        source: &Arc<dyn DataSource>,
        code: &StockCode,
        range: &DateRange,
    ) -> Result<DailySeries, HangqingError> {
        let name = source.name();
        let attempts = self.cfg.max_retries + 1;
        let mut last_err: Option<HangqingError> = None;

        for attempt in 1..=attempts {
            match self.attempt(source, code, range).await {
                Ok(series) => return Ok(series),
                Err(err) => {
                    self.stats.record_failure(name);
                    tracing::debug!(source = name, attempt, %err, "attempt failed");
                    last_err = Some(err);
                    if attempt < attempts {
                        tokio::time::sleep(jitter(self.cfg.retry_delay)).await;
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| HangqingError::transient(name, "no attempts were made")))
    }

    /// One bounded call: fetch, reject empties, normalize.
    async fn attempt(
        &self,
        source: &Arc<dyn DataSource>,
        code: &StockCode,
        range: &DateRange,
    ) -> Result<DailySeries, HangqingError> {
        let name = source.name();
        let frame = tokio::time::timeout(self.cfg.call_timeout, source.fetch_daily(code, range))
            .await
            .map_err(|_| HangqingError::timeout(name))??;
        if frame.is_empty() {
            return Err(HangqingError::transient(name, "empty frame"));
        }
        let series = normalize(&frame)?;
        if series.is_empty() {
            return Err(HangqingError::transient(
                name,
                "no usable rows after normalization",
            ));
        }
        Ok(series)
    }

    /// Enabled ∩ available sources, ordered by the configured policy.
    fn candidates(&self) -> Vec<Arc<dyn DataSource>> {
        let mut eligible: Vec<(u32, usize, Arc<dyn DataSource>)> = Vec::new();
        for (idx, entry) in self.sources.iter().enumerate() {
            if !entry.enabled {
                continue;
            }
            if !entry.source.is_available() {
                tracing::debug!(source = entry.source.name(), "skipping unavailable source");
                continue;
            }
            eligible.push((entry.priority, idx, entry.source.clone()));
        }
        eligible.sort_by_key(|(priority, idx, _)| (*priority, *idx));

        let mut ordered: Vec<Arc<dyn DataSource>> =
            eligible.into_iter().map(|(_, _, s)| s).collect();
        if self.cfg.ordering == OrderingPolicy::Shuffle {
            let mut rng = rand::rng();
            ordered.shuffle(&mut rng);
        }
        ordered
    }
}

/// Uniformly random delay within the configured jitter bounds.
pub(crate) fn jitter(bounds: (Duration, Duration)) -> Duration {
    let (min, max) = bounds;
    if max <= min {
        return min;
    }
    let mut rng = rand::rng();
    let ms = rng.random_range(min.as_millis()..=max.as_millis());
    Duration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX))
}
