use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use hangqing_core::{DailySeries, DateRange, MacroKind, RawFrame, StockCode};

/// Envelope written for every cache entry.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    cached_at: DateTime<Utc>,
    data: T,
}

/// Durable file-per-key cache for fetched series.
///
/// Layout:
/// - `{root}/stock/{CODE.EX}_{YYYYMMDD}_{YYYYMMDD}.json` for daily series
/// - `{root}/macro/{kind}.json` for macro frames
///
/// Keys are joined with a fixed `_` delimiter; all key fields are
/// alphanumeric dates and codes, so no escaping is needed. Reads that hit a
/// missing file, unreadable JSON, or a structurally empty payload are misses,
/// never errors. Saves of empty payloads are skipped. Writes go to a `.tmp`
/// sibling and are renamed into place, so concurrent writers to the same key
/// degrade to last-writer-wins without torn files.
pub struct CacheStore {
    root: PathBuf,
    ttl: Option<Duration>,
}

impl CacheStore {
    /// Open a store rooted at `root`. Directories are created lazily on the
    /// first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ttl: None,
        }
    }

    /// Bound entry age: entries older than `ttl` are treated as misses.
    ///
    /// The base design keeps entries forever (the only invalidation is file
    /// absence or an explicit cache bypass); this opt-in bound exists for
    /// callers that re-query ranges including the current day.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Root directory of the cache.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stock_path(&self, code: &StockCode, range: &DateRange) -> PathBuf {
        self.root.join("stock").join(format!(
            "{}_{}_{}.json",
            code,
            range.start_compact(),
            range.end_compact()
        ))
    }

    fn macro_path(&self, kind: MacroKind) -> PathBuf {
        self.root.join("macro").join(format!("{}.json", kind.id()))
    }

    /// Look up a cached daily series by exact key. Returns `None` on any
    /// miss, expiry, or corruption.
    #[must_use]
    pub fn load_stock(&self, code: &StockCode, range: &DateRange) -> Option<DailySeries> {
        let series: DailySeries = self.load_entry(&self.stock_path(code, range))?;
        if series.is_empty() { None } else { Some(series) }
    }

    /// Persist a daily series under its key, overwriting any existing entry.
    /// Empty series are not persisted; I/O failures are logged and absorbed.
    pub fn save_stock(&self, code: &StockCode, range: &DateRange, series: &DailySeries) {
        if series.is_empty() {
            return;
        }
        self.save_entry(&self.stock_path(code, range), series);
    }

    /// Look up a cached macro frame. Returns `None` on any miss, expiry, or
    /// corruption.
    #[must_use]
    pub fn load_macro(&self, kind: MacroKind) -> Option<RawFrame> {
        let frame: RawFrame = self.load_entry(&self.macro_path(kind))?;
        if frame.is_empty() { None } else { Some(frame) }
    }

    /// Persist a macro frame under its kind key. Empty frames are not
    /// persisted; I/O failures are logged and absorbed.
    pub fn save_macro(&self, kind: MacroKind, frame: &RawFrame) {
        if frame.is_empty() {
            return;
        }
        self.save_entry(&self.macro_path(kind), frame);
    }

    fn load_entry<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let content = fs::read_to_string(path).ok()?;
        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "unreadable cache entry, treating as miss");
                return None;
            }
        };
        if let Some(ttl) = self.ttl {
            let age = Utc::now().signed_duration_since(entry.cached_at);
            if age.to_std().map_or(true, |a| a > ttl) {
                tracing::debug!(path = %path.display(), "cache entry expired");
                return None;
            }
        }
        Some(entry.data)
    }

    fn save_entry<T: Serialize>(&self, path: &Path, data: &T) {
        if let Err(err) = self.try_save(path, data) {
            tracing::warn!(path = %path.display(), %err, "cache write failed, skipping");
        }
    }

    fn try_save<T: Serialize>(&self, path: &Path, data: &T) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let entry = CacheEntry {
            cached_at: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp);
        })
    }
}
