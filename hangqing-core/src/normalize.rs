//! Schema normalization: provider-native frames into canonical daily series.
//!
//! Upstreams disagree on almost everything: column names (bilingual), date
//! shapes (`2024-01-02`, `20240102`, end-of-bar RFC 3339 timestamps), and cell
//! types (strings vs numbers). This module owns the fixed alias tables and
//! produces one canonical, date-ordered series regardless of origin.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Asia::Shanghai;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::frame::{RawFrame, RawValue};
use crate::types::{Bar, DailySeries};
use crate::HangqingError;

/// Known aliases for the trading-date column, in any language or bar shape.
/// `eob`/`bob` are the broker SDK's end/begin-of-bar timestamp columns.
const DATE_ALIASES: &[&str] = &["date", "日期", "eob", "bob", "day", "trade_date", "时间"];

const OPEN_ALIASES: &[&str] = &["open", "开盘", "开盘价"];
const HIGH_ALIASES: &[&str] = &["high", "最高", "最高价"];
const LOW_ALIASES: &[&str] = &["low", "最低", "最低价"];
const CLOSE_ALIASES: &[&str] = &["close", "收盘", "收盘价"];
const VOLUME_ALIASES: &[&str] = &["volume", "成交量", "vol"];

struct FieldMap<'a> {
    date: &'a [RawValue],
    open: &'a [RawValue],
    high: &'a [RawValue],
    low: &'a [RawValue],
    close: &'a [RawValue],
    volume: &'a [RawValue],
}

/// Normalize a provider-native frame into a canonical daily series.
///
/// Column resolution scans the frame's columns in order and claims the first
/// column matching each canonical target; when several aliases of the same
/// target are present simultaneously, only the first is honored. Rows whose
/// date or any OHLCV cell cannot be parsed are dropped. The result is sorted
/// by date with duplicates removed, so normalizing already-canonical data is
/// a no-op.
///
/// # Errors
/// Returns `Schema` when no recognizable date column exists or a canonical
/// price/volume column is missing entirely.
pub fn normalize(frame: &RawFrame) -> Result<DailySeries, HangqingError> {
    let fields = resolve_columns(frame)?;
    let rows = frame.row_count();
    let mut bars = Vec::with_capacity(rows);
    for i in 0..rows {
        let Some(date) = parse_date(&fields.date[i]) else {
            continue;
        };
        let (Some(open), Some(high), Some(low), Some(close)) = (
            parse_price(&fields.open[i]),
            parse_price(&fields.high[i]),
            parse_price(&fields.low[i]),
            parse_price(&fields.close[i]),
        ) else {
            continue;
        };
        let Some(volume) = parse_volume(&fields.volume[i]) else {
            continue;
        };
        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }
    Ok(DailySeries::from_bars(bars))
}

fn resolve_columns(frame: &RawFrame) -> Result<FieldMap<'_>, HangqingError> {
    let mut date = None;
    let mut open = None;
    let mut high = None;
    let mut low = None;
    let mut close = None;
    let mut volume = None;

    for col in frame.columns() {
        let name = col.name.trim();
        let slot = if DATE_ALIASES.contains(&name) {
            &mut date
        } else if OPEN_ALIASES.contains(&name) {
            &mut open
        } else if HIGH_ALIASES.contains(&name) {
            &mut high
        } else if LOW_ALIASES.contains(&name) {
            &mut low
        } else if CLOSE_ALIASES.contains(&name) {
            &mut close
        } else if VOLUME_ALIASES.contains(&name) {
            &mut volume
        } else {
            // Columns outside the canonical set (amount, turnover, ...) are dropped.
            continue;
        };
        if slot.is_none() {
            *slot = Some(col.values.as_slice());
        }
    }

    let date = date.ok_or_else(|| HangqingError::schema("no recognizable date column"))?;
    let missing = |what: &str| HangqingError::schema(format!("missing {what} column"));
    Ok(FieldMap {
        date,
        open: open.ok_or_else(|| missing("open"))?,
        high: high.ok_or_else(|| missing("high"))?,
        low: low.ok_or_else(|| missing("low"))?,
        close: close.ok_or_else(|| missing("close"))?,
        volume: volume.ok_or_else(|| missing("volume"))?,
    })
}

/// Parse a date-like cell. Textual cells accept plain dates, compact dates,
/// date-times, and RFC 3339 bar timestamps; timestamps are mapped to the
/// Asia/Shanghai trading day. Numeric cells accept compact `YYYYMMDD` values.
fn parse_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Text(s) => {
            let s = s.trim();
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(d);
            }
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d") {
                return Some(d);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt.date());
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Shanghai).date_naive());
            }
            None
        }
        RawValue::Number(n) => {
            if n.fract() != 0.0 || *n < 19_000_101.0 || *n > 21_001_231.0 {
                return None;
            }
            NaiveDate::parse_from_str(&format!("{:.0}", n), "%Y%m%d").ok()
        }
        RawValue::Null => None,
    }
}

fn parse_price(value: &RawValue) -> Option<Decimal> {
    match value {
        RawValue::Text(s) => Decimal::from_str(s.trim()).ok(),
        RawValue::Number(n) => Decimal::try_from(*n).ok(),
        RawValue::Null => None,
    }
}

fn parse_volume(value: &RawValue) -> Option<f64> {
    let v = value.as_f64()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}
