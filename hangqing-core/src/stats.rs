//! Per-source success/failure bookkeeping.
//!
//! Counters are observability only — routing never consults them. Updates
//! must be safe from the scan worker pool, so counts are atomic and the
//! counter table is fixed at construction time (no locking on the hot path).

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

struct Counter {
    name: &'static str,
    success: AtomicU64,
    failure: AtomicU64,
}

/// Process-lifetime counters for a fixed set of sources.
pub struct SourceStats {
    counters: Vec<Counter>,
    last_success: Mutex<Option<&'static str>>,
}

impl SourceStats {
    /// Build a stats table for the given source names. Unknown names passed
    /// to the record methods later are ignored.
    #[must_use]
    pub fn for_sources<I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        Self {
            counters: names
                .into_iter()
                .map(|name| Counter {
                    name,
                    success: AtomicU64::new(0),
                    failure: AtomicU64::new(0),
                })
                .collect(),
            last_success: Mutex::new(None),
        }
    }

    fn counter(&self, name: &str) -> Option<&Counter> {
        self.counters.iter().find(|c| c.name == name)
    }

    /// Record one successful fetch for `name` and remember it as the last
    /// successful source.
    pub fn record_success(&self, name: &'static str) {
        if let Some(c) = self.counter(name) {
            c.success.fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut last) = self.last_success.lock() {
            *last = Some(name);
        }
    }

    /// Record one failed attempt for `name`.
    pub fn record_failure(&self, name: &str) {
        if let Some(c) = self.counter(name) {
            c.failure.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The most recent source that served a successful fetch, if any.
    pub fn last_success(&self) -> Option<&'static str> {
        self.last_success.lock().ok().and_then(|g| *g)
    }

    /// Snapshot the counters into a printable report.
    #[must_use]
    pub fn report(&self) -> SourceStatusReport {
        SourceStatusReport {
            rows: self
                .counters
                .iter()
                .map(|c| SourceStatusRow {
                    source: c.name,
                    success: c.success.load(Ordering::Relaxed),
                    failure: c.failure.load(Ordering::Relaxed),
                })
                .collect(),
            last_success: self.last_success(),
        }
    }
}

/// One row of the status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStatusRow {
    /// Source name.
    pub source: &'static str,
    /// Successful fetches.
    pub success: u64,
    /// Failed attempts.
    pub failure: u64,
}

impl SourceStatusRow {
    /// Success rate in percent; 0 when the source was never attempted.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let total = self.success + self.failure;
        if total == 0 {
            0.0
        } else {
            self.success as f64 / total as f64 * 100.0
        }
    }
}

/// Point-in-time snapshot of all source counters.
#[derive(Debug, Clone)]
pub struct SourceStatusReport {
    rows: Vec<SourceStatusRow>,
    last_success: Option<&'static str>,
}

impl SourceStatusReport {
    /// Rows in source registration order.
    #[must_use]
    pub fn rows(&self) -> &[SourceStatusRow] {
        &self.rows
    }

    /// Last source that served a successful fetch, if any.
    #[must_use]
    pub const fn last_success(&self) -> Option<&'static str> {
        self.last_success
    }
}

impl fmt::Display for SourceStatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "source status:")?;
        for row in &self.rows {
            writeln!(
                f,
                "  {:<12} | ok: {:>4} | fail: {:>4} | {:>5.1}%",
                row.source,
                row.success,
                row.failure,
                row.success_rate()
            )?;
        }
        if let Some(last) = self.last_success {
            writeln!(f, "  last success: {last}")?;
        }
        Ok(())
    }
}
