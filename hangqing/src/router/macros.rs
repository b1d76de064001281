use hangqing_core::{HangqingError, MacroKind, MacroSource, RawFrame};

use crate::core::Hangqing;

impl Hangqing {
    /// Fetch one macro series (CPI, GDP, PMI, FX) in its upstream's native
    /// frame shape.
    ///
    /// Macro data takes the simpler single-source path: no multi-source
    /// fallback, just bounded retries against the one configured upstream.
    /// After the retry budget is exhausted an empty frame is returned rather
    /// than an error, so callers can treat "no data" uniformly. Caching works
    /// as for stock data, keyed by the macro kind.
    ///
    /// # Errors
    /// Returns `Unsupported` when no registered source advertises the macro
    /// capability and no explicit macro source was configured.
    pub async fn fetch_macro_data(
        &self,
        kind: MacroKind,
        use_cache: bool,
    ) -> Result<RawFrame, HangqingError> {
        let provider = self
            .macro_provider
            .as_ref()
            .and_then(|p| p.resolve())
            .ok_or(HangqingError::unsupported("macro data"))?;

        if use_cache {
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.load_macro(kind) {
                    tracing::debug!(%kind, rows = hit.row_count(), "macro cache hit");
                    return Ok(hit);
                }
            }
        }

        let frame = self.fetch_macro_with_retry(provider, kind).await;

        if use_cache && !frame.is_empty() {
            if let Some(cache) = &self.cache {
                cache.save_macro(kind, &frame);
            }
        }
        Ok(frame)
    }

    async fn fetch_macro_with_retry(&self, source: &dyn MacroSource, kind: MacroKind) -> RawFrame {
        let name = source.name();
        let attempts = self.cfg.max_retries + 1;

        for attempt in 1..=attempts {
            match tokio::time::timeout(self.cfg.call_timeout, source.fetch_macro(kind)).await {
                Ok(Ok(frame)) => {
                    tracing::info!(source = name, %kind, rows = frame.row_count(), "macro fetch succeeded");
                    return frame;
                }
                Ok(Err(err)) => {
                    tracing::warn!(source = name, %kind, attempt, %err, "macro fetch failed");
                }
                Err(_) => {
                    tracing::warn!(source = name, %kind, attempt, "macro fetch timed out");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(super::history::jitter(self.cfg.retry_delay)).await;
            }
        }

        tracing::warn!(source = name, %kind, "macro retries exhausted, returning empty frame");
        RawFrame::new()
    }
}
