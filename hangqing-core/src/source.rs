use async_trait::async_trait;

use crate::frame::RawFrame;
use crate::types::{DateRange, MacroKind, SourceKey, StockCode};
use crate::HangqingError;

/// Main trait implemented by data sources. One implementation per upstream.
///
/// Sources return their payloads in provider-native shape; normalization into
/// the canonical schema happens centrally in the orchestrator. A source must
/// fail with a descriptive error — never return a valid-looking empty frame —
/// on transport errors, empty result sets, or unparsable responses.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// A stable identifier used for priority lists, stats, and logging
    /// (e.g. "sina", "juejin").
    fn name(&self) -> &'static str;

    /// Canonical source key constructed from the static name.
    fn key(&self) -> SourceKey {
        SourceKey::new(self.name())
    }

    /// Whether the source can run at all (credential configured, dependency
    /// present). Unavailable sources are skipped without any attempt and do
    /// not count toward statistics.
    fn is_available(&self) -> bool {
        true
    }

    /// Fetch daily history for the given code and inclusive date range, in
    /// the source's native frame shape.
    async fn fetch_daily(
        &self,
        code: &StockCode,
        range: &DateRange,
    ) -> Result<RawFrame, HangqingError>;

    /// Advertise macro-series capability by returning a usable trait object
    /// reference when supported.
    fn as_macro_source(&self) -> Option<&dyn MacroSource> {
        None
    }
}

/// Role trait for sources that can additionally serve macro series
/// (CPI, GDP, PMI, FX). Macro data follows a simpler single-source path.
#[async_trait]
pub trait MacroSource: Send + Sync {
    /// Stable identifier for logging.
    fn name(&self) -> &'static str;

    /// Fetch one macro series in the source's native frame shape.
    async fn fetch_macro(&self, kind: MacroKind) -> Result<RawFrame, HangqingError>;
}
