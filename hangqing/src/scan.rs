use futures::StreamExt;
use futures::stream;

use hangqing_core::{DailySeries, DateRange, HangqingError};

use crate::core::Hangqing;

/// Result of one symbol within a multi-symbol scan.
pub struct ScanOutcome {
    /// The symbol as passed by the caller.
    pub symbol: String,
    /// The fetch result; per-symbol failures never abort the batch.
    pub result: Result<DailySeries, HangqingError>,
}

impl Hangqing {
    /// Fetch many symbols over the same range with bounded parallelism.
    ///
    /// Each worker runs one fully sequential facade fetch; the only state
    /// shared across workers is the per-source counters. Results complete in
    /// arbitrary order, and a symbol that exhausts every source is reported
    /// in its outcome rather than failing the batch.
    pub async fn fetch_many(
        &self,
        symbols: &[&str],
        range: &DateRange,
        use_cache: bool,
    ) -> Vec<ScanOutcome> {
        let workers = self.cfg.scan_workers.max(1);
        let range = *range;

        stream::iter(symbols.iter().map(|s| (*s).to_string()))
            .map(|symbol| async move {
                let result = self.fetch_stock_data(&symbol, &range, use_cache).await;
                if let Err(err) = &result {
                    tracing::warn!(symbol = %symbol, %err, "scan fetch failed");
                }
                ScanOutcome { symbol, result }
            })
            .buffer_unordered(workers)
            .collect()
            .await
    }
}
