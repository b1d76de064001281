//! Hangqing fetches daily China A-share history from multiple unreliable
//! upstreams and hands downstream consumers one clean, canonical series.
//!
//! Overview
//! - Routes each request through an ordered list of `DataSource`
//!   implementations, retrying with jittered backoff and failing over to the
//!   next source automatically.
//! - Normalizes heterogeneous upstream schemas (bilingual column names,
//!   mixed date shapes, stringly-typed numbers) into one canonical daily
//!   OHLCV series.
//! - Serves repeat requests from a durable file-per-key cache that agrees
//!   with the fetch layer on keys; cache problems degrade to misses, never
//!   errors.
//! - Tracks per-source success/failure counters for observability only.
//!
//! Key behaviors and trade-offs
//! - Ordering: `Priority` is deterministic and economical on well-behaved
//!   sources; `Shuffle` spreads load across sources at the cost of
//!   predictability.
//! - `auto_fallback`: on by default. Disabling it surfaces the first
//!   source's exhaustion immediately, which is useful when falling through
//!   to lower-quality sources is worse than failing.
//! - Macro series (CPI, GDP, PMI, FX) take a simpler single-source path with
//!   retries but no fallback, and return an empty frame on exhaustion.
//!
//! Fetching one symbol and a batch:
//! ```rust,ignore
//! use hangqing::{DateRange, Hangqing};
//!
//! let range = DateRange::parse("20240101", "20240131")?;
//! let series = hq.fetch_stock_data("600519", &range, true).await?;
//!
//! let outcomes = hq.fetch_many(&["600519", "000001"], &range, true).await;
//! for outcome in &outcomes {
//!     // per-symbol failures arrive here instead of aborting the batch
//! }
//! println!("{}", hq.source_status());
//! ```
#![warn(missing_docs)]

pub(crate) mod core;
mod router;
mod scan;

pub use core::{Hangqing, HangqingBuilder};
pub use scan::ScanOutcome;

pub use hangqing_cache::CacheStore;

// Re-export core types for convenience
pub use hangqing_core::{
    Bar,
    DailySeries,
    DataSource,
    DateRange,
    Exchange,
    FetchConfig,
    HangqingError,
    MacroKind,
    MacroSource,
    OrderingPolicy,
    RawColumn,
    RawFrame,
    RawValue,
    SourceKey,
    SourceStatusReport,
    SourceStatusRow,
    StockCode,
    normalize,
};
