//! Canonical domain types shared across the hangqing workspace.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::HangqingError;
use crate::frame::{RawFrame, RawValue};

/// Mainland exchange a security trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// Shanghai Stock Exchange.
    Shanghai,
    /// Shenzhen Stock Exchange.
    Shenzhen,
}

impl Exchange {
    /// Two-letter market suffix ("SH" / "SZ").
    #[must_use]
    pub const fn abbr(self) -> &'static str {
        match self {
            Self::Shanghai => "SH",
            Self::Shenzhen => "SZ",
        }
    }

    /// Infer the exchange from the leading digit of a numeric code.
    ///
    /// Codes starting with `6` or `5` trade in Shanghai; everything else
    /// (`0`, `3`, ...) trades in Shenzhen.
    #[must_use]
    pub const fn from_leading_digit(digit: u8) -> Self {
        match digit {
            b'6' | b'5' => Self::Shanghai,
            _ => Self::Shenzhen,
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SH" => Some(Self::Shanghai),
            "SZ" => Some(Self::Shenzhen),
            _ => None,
        }
    }
}

/// A validated A-share security code with its resolved exchange.
///
/// Accepts a bare six-digit code (`"600519"`) or a code with a market suffix
/// (`"600519.SH"`, case-insensitive). Without a suffix, the exchange is
/// inferred from the leading digit. An explicit suffix always wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockCode {
    code: String,
    exchange: Exchange,
}

impl StockCode {
    /// Parse a symbol as accepted by the facade.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the numeric part is not exactly six ASCII
    /// digits or the suffix is not a known market abbreviation.
    pub fn parse(symbol: &str) -> Result<Self, HangqingError> {
        let symbol = symbol.trim();
        let (code, suffix) = match symbol.split_once('.') {
            Some((c, s)) => (c, Some(s)),
            None => (symbol, None),
        };
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HangqingError::invalid_arg(format!(
                "invalid security code: {symbol:?}"
            )));
        }
        let exchange = match suffix {
            Some(s) => Exchange::from_suffix(s).ok_or_else(|| {
                HangqingError::invalid_arg(format!("unknown market suffix: {s:?}"))
            })?,
            None => Exchange::from_leading_digit(code.as_bytes()[0]),
        };
        Ok(Self {
            code: code.to_string(),
            exchange,
        })
    }

    /// The bare six-digit code without any market suffix.
    #[must_use]
    pub fn bare(&self) -> &str {
        &self.code
    }

    /// The resolved exchange.
    #[must_use]
    pub const fn exchange(&self) -> Exchange {
        self.exchange
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.code, self.exchange.abbr())
    }
}

/// An inclusive calendar date range for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range from two dates.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, HangqingError> {
        if start > end {
            return Err(HangqingError::invalid_arg(format!(
                "range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from date strings in either `YYYYMMDD` or `YYYY-MM-DD`
    /// form (the two formats callers of the facade use interchangeably).
    ///
    /// # Errors
    /// Returns `InvalidArg` when either string is not a valid date or the
    /// range is inverted.
    pub fn parse(start: &str, end: &str) -> Result<Self, HangqingError> {
        Self::new(parse_request_date(start)?, parse_request_date(end)?)
    }

    /// Range start (inclusive).
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Range end (inclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Start date as a compact `YYYYMMDD` string.
    #[must_use]
    pub fn start_compact(&self) -> String {
        self.start.format("%Y%m%d").to_string()
    }

    /// End date as a compact `YYYYMMDD` string.
    #[must_use]
    pub fn end_compact(&self) -> String {
        self.end.format("%Y%m%d").to_string()
    }

    /// Start date as a dashed `YYYY-MM-DD` string.
    #[must_use]
    pub fn start_dashed(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// End date as a dashed `YYYY-MM-DD` string.
    #[must_use]
    pub fn end_dashed(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

fn parse_request_date(s: &str) -> Result<NaiveDate, HangqingError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .map_err(|_| HangqingError::invalid_arg(format!("invalid date: {s:?}")))
}

/// Macro series served by the single macro upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MacroKind {
    /// Consumer price index.
    Cpi,
    /// Gross domestic product.
    Gdp,
    /// Purchasing managers' index.
    Pmi,
    /// Spot foreign exchange quotes.
    Fx,
}

impl MacroKind {
    /// Stable identifier used as the cache key for this series.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Cpi => "cpi",
            Self::Gdp => "gdp",
            Self::Pmi => "pmi",
            Self::Fx => "fx",
        }
    }
}

impl fmt::Display for MacroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One daily OHLCV record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Trading date (no time-of-day).
    pub date: NaiveDate,
    /// Opening price.
    pub open: Decimal,
    /// Intraday high.
    pub high: Decimal,
    /// Intraday low.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Traded volume.
    pub volume: f64,
}

/// A canonical daily OHLCV series.
///
/// Dates are strictly increasing with no duplicates; missing trading days are
/// simply absent. The series is immutable once produced — consumers derive
/// new series rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailySeries {
    bars: Vec<Bar>,
}

impl DailySeries {
    /// Build a series from bars in any order.
    ///
    /// Bars are sorted by date; when the same date appears more than once the
    /// first occurrence wins.
    #[must_use]
    pub fn from_bars(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Self { bars }
    }

    /// The ordered bars.
    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether the series holds no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Re-export the series in raw-frame form with canonical column names.
    #[must_use]
    pub fn to_frame(&self) -> RawFrame {
        let mut frame = RawFrame::new();
        let dates = self
            .bars
            .iter()
            .map(|b| RawValue::text(b.date.format("%Y-%m-%d").to_string()))
            .collect();
        let decimal_col = |get: fn(&Bar) -> Decimal| -> Vec<RawValue> {
            self.bars
                .iter()
                .map(|b| RawValue::text(get(b).to_string()))
                .collect()
        };
        let volumes = self
            .bars
            .iter()
            .map(|b| RawValue::Number(b.volume))
            .collect();
        // Column lengths all derive from the same bars, so pushes cannot fail.
        let _ = frame.push_column("date", dates);
        let _ = frame.push_column("open", decimal_col(|b| b.open));
        let _ = frame.push_column("high", decimal_col(|b| b.high));
        let _ = frame.push_column("low", decimal_col(|b| b.low));
        let _ = frame.push_column("close", decimal_col(|b| b.close));
        let _ = frame.push_column("volume", volumes);
        frame
    }
}

/// Candidate ordering applied by the fallback orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum OrderingPolicy {
    /// Try sources in configured priority order (ties broken by registration
    /// order). Deterministic and economical on well-behaved sources.
    #[default]
    Priority,
    /// Shuffle the candidate list per request to spread load across sources
    /// instead of hammering the highest-priority one.
    Shuffle,
}

/// Global knobs for the fallback orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Retries per source before moving on (attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Jitter bounds for the randomized delay between attempts.
    pub retry_delay: (Duration, Duration),
    /// `true`: try the next source after one exhausts its attempts.
    /// `false`: propagate the first exhaustion as fatal.
    pub auto_fallback: bool,
    /// Candidate ordering policy.
    pub ordering: OrderingPolicy,
    /// Timeout applied to each individual source call, independent of the
    /// retry/backoff timing.
    pub call_timeout: Duration,
    /// Worker count for multi-symbol scans.
    pub scan_workers: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: (Duration::from_millis(500), Duration::from_millis(1500)),
            auto_fallback: true,
            ordering: OrderingPolicy::default(),
            call_timeout: Duration::from_secs(20),
            scan_workers: 8,
        }
    }
}

/// Typed identifier for a data source, constructed from its static name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceKey(&'static str);

impl SourceKey {
    /// Wrap a static source name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The underlying name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_code_infers_exchange_from_leading_digit() {
        assert_eq!(
            StockCode::parse("600519").unwrap().exchange(),
            Exchange::Shanghai
        );
        assert_eq!(
            StockCode::parse("510300").unwrap().exchange(),
            Exchange::Shanghai
        );
        assert_eq!(
            StockCode::parse("000001").unwrap().exchange(),
            Exchange::Shenzhen
        );
        assert_eq!(
            StockCode::parse("300750").unwrap().exchange(),
            Exchange::Shenzhen
        );
    }

    #[test]
    fn stock_code_explicit_suffix_wins() {
        let code = StockCode::parse("600519.sz").unwrap();
        assert_eq!(code.exchange(), Exchange::Shenzhen);
        assert_eq!(code.to_string(), "600519.SZ");
    }

    #[test]
    fn stock_code_rejects_garbage() {
        assert!(StockCode::parse("60051").is_err());
        assert!(StockCode::parse("60051A").is_err());
        assert!(StockCode::parse("600519.XX").is_err());
        assert!(StockCode::parse("").is_err());
    }

    #[test]
    fn date_range_parses_both_formats() {
        let a = DateRange::parse("20240101", "20240131").unwrap();
        let b = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.start_compact(), "20240101");
        assert_eq!(a.end_dashed(), "2024-01-31");
    }

    #[test]
    fn date_range_rejects_inverted() {
        assert!(DateRange::parse("20240201", "20240101").is_err());
    }

    #[test]
    fn series_sorts_and_dedups_first_wins() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let bar = |day, close: i64| Bar {
            date: d(day),
            open: Decimal::from(close),
            high: Decimal::from(close),
            low: Decimal::from(close),
            close: Decimal::from(close),
            volume: 1.0,
        };
        let series = DailySeries::from_bars(vec![bar(3, 3), bar(2, 2), bar(3, 99)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date, d(2));
        assert_eq!(series.bars()[1].close, Decimal::from(3));
    }
}
