use std::sync::Arc;
use std::time::Duration;

use hangqing_cache::CacheStore;
use hangqing_core::{
    DataSource, FetchConfig, HangqingError, MacroSource, OrderingPolicy, SourceStats,
    SourceStatusReport,
};

/// One registered source with its routing attributes.
pub(crate) struct SourceEntry {
    pub source: Arc<dyn DataSource>,
    pub enabled: bool,
    pub priority: u32,
}

/// How macro requests are served: an explicitly configured upstream, or the
/// macro capability discovered on a registered source at build time.
pub(crate) enum MacroProvider {
    Explicit(Arc<dyn MacroSource>),
    FromSource(Arc<dyn DataSource>),
}

impl MacroProvider {
    pub(crate) fn resolve(&self) -> Option<&dyn MacroSource> {
        match self {
            Self::Explicit(m) => Some(&**m),
            Self::FromSource(s) => s.as_macro_source(),
        }
    }
}

/// Resilient facade over an ordered list of data sources.
///
/// Combines the cache store with the fallback orchestrator: a fetch is served
/// from cache when possible, otherwise sources are tried in order with
/// bounded, jittered retries until one yields a usable series.
pub struct Hangqing {
    pub(crate) sources: Vec<SourceEntry>,
    pub(crate) macro_provider: Option<MacroProvider>,
    pub(crate) cache: Option<CacheStore>,
    pub(crate) cfg: FetchConfig,
    pub(crate) stats: SourceStats,
}

impl Hangqing {
    /// Start building a new `Hangqing` instance.
    ///
    /// Typical usage registers sources in priority order and wires a cache:
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    ///
    /// let hq = hangqing::Hangqing::builder()
    ///     .with_source(Arc::new(JuejinSource::new(sdk)))
    ///     .with_source(Arc::new(SinaSource::new()))
    ///     .with_source(Arc::new(EastmoneySource::new()))
    ///     .with_cache_dir("cache")
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> HangqingBuilder {
        HangqingBuilder::new()
    }

    /// Snapshot the per-source success/failure counters.
    #[must_use]
    pub fn source_status(&self) -> SourceStatusReport {
        self.stats.report()
    }

    /// The source that served the most recent successful fetch, if any.
    #[must_use]
    pub fn last_success_source(&self) -> Option<&'static str> {
        self.stats.last_success()
    }
}

/// Builder for a [`Hangqing`] facade.
pub struct HangqingBuilder {
    sources: Vec<SourceEntry>,
    macro_source: Option<Arc<dyn MacroSource>>,
    cache: Option<CacheStore>,
    cfg: FetchConfig,
}

impl Default for HangqingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HangqingBuilder {
    /// Create a builder with the default configuration: 3 retries per source,
    /// 0.5–1.5 s jittered delay between attempts, automatic fallback,
    /// priority ordering, 20 s per-call timeout, no cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            macro_source: None,
            cache: None,
            cfg: FetchConfig::default(),
        }
    }

    fn push_source(&mut self, source: Arc<dyn DataSource>, enabled: bool, priority: Option<u32>) {
        let priority = priority.unwrap_or(u32::try_from(self.sources.len()).unwrap_or(u32::MAX));
        self.sources.push(SourceEntry {
            source,
            enabled,
            priority,
        });
    }

    /// Register an enabled source. Registration order doubles as priority
    /// unless an explicit priority is set.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.push_source(source, true, None);
        self
    }

    /// Register an enabled source with an explicit priority (lower tries
    /// first; ties broken by registration order).
    #[must_use]
    pub fn with_source_priority(mut self, source: Arc<dyn DataSource>, priority: u32) -> Self {
        self.push_source(source, true, Some(priority));
        self
    }

    /// Register a source that stays configured but is never tried. Useful
    /// for keeping a descriptor in place while an upstream misbehaves.
    #[must_use]
    pub fn with_disabled_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.push_source(source, false, None);
        self
    }

    /// Set the macro-series upstream explicitly. Without this, the first
    /// enabled source advertising the macro capability is used.
    #[must_use]
    pub fn with_macro_source(mut self, source: Arc<dyn MacroSource>) -> Self {
        self.macro_source = Some(source);
        self
    }

    /// Attach a cache store.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach a cache store rooted at `dir`.
    #[must_use]
    pub fn with_cache_dir(self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.with_cache(CacheStore::new(dir))
    }

    /// Retries per source before moving on (attempts = `max_retries + 1`).
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.cfg.max_retries = retries;
        self
    }

    /// Jitter bounds for the randomized delay between attempts.
    #[must_use]
    pub const fn retry_delay(mut self, min: Duration, max: Duration) -> Self {
        self.cfg.retry_delay = (min, max);
        self
    }

    /// `true` (default): try the next source after one exhausts its attempt
    /// budget. `false`: propagate the first exhaustion as fatal.
    #[must_use]
    pub const fn auto_fallback(mut self, yes: bool) -> Self {
        self.cfg.auto_fallback = yes;
        self
    }

    /// Candidate ordering policy.
    #[must_use]
    pub const fn ordering(mut self, policy: OrderingPolicy) -> Self {
        self.cfg.ordering = policy;
        self
    }

    /// Timeout applied to each individual source call, independent of the
    /// retry/backoff timing.
    #[must_use]
    pub const fn call_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.call_timeout = timeout;
        self
    }

    /// Worker count for multi-symbol scans.
    #[must_use]
    pub const fn scan_workers(mut self, workers: usize) -> Self {
        self.cfg.scan_workers = workers;
        self
    }

    /// Build the facade.
    ///
    /// # Errors
    /// Returns `InvalidArg` when no sources are registered or the retry-delay
    /// bounds are inverted.
    pub fn build(self) -> Result<Hangqing, HangqingError> {
        if self.sources.is_empty() {
            return Err(HangqingError::invalid_arg(
                "no sources registered; add at least one via with_source(...)",
            ));
        }
        let (min, max) = self.cfg.retry_delay;
        if min > max {
            return Err(HangqingError::invalid_arg(format!(
                "retry delay minimum {min:?} exceeds maximum {max:?}"
            )));
        }

        let stats = SourceStats::for_sources(self.sources.iter().map(|e| e.source.name()));

        let macro_provider = match self.macro_source {
            Some(m) => Some(MacroProvider::Explicit(m)),
            None => self
                .sources
                .iter()
                .find(|e| e.enabled && e.source.as_macro_source().is_some())
                .map(|e| MacroProvider::FromSource(e.source.clone())),
        };

        Ok(Hangqing {
            sources: self.sources,
            macro_provider,
            cache: self.cache,
            cfg: self.cfg,
            stats,
        })
    }
}
