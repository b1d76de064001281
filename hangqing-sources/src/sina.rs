use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use hangqing_core::{
    DataSource, DateRange, Exchange, HangqingError, RawFrame, RawValue, StockCode,
};

use crate::util::{HTTP_TIMEOUT, json_to_raw, transport_err};

const SOURCE_NAME: &str = "sina";
const DEFAULT_BASE_URL: &str = "https://money.finance.sina.com.cn";
const KLINE_PATH: &str = "/quotes_service/api/json_v2.php/CN_MarketData.getKLineData";

/// Sina Finance kline source.
///
/// The kline endpoint has no date-range parameters: it returns the most
/// recent `datalen` daily bars for a symbol, so this source over-fetches and
/// filters rows down to the requested range before returning. Column names
/// are English (`day/open/high/low/close/volume`), prices arrive as strings.
pub struct SinaSource {
    client: Client,
    base_url: String,
}

impl Default for SinaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SinaSource {
    /// Build a source against the production endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Build a source against a custom endpoint (tests point this at a local
    /// mock server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

/// Convert to Sina's symbol format: lowercase market prefix, no separator
/// (`600519.SH` → `sh600519`).
#[must_use]
pub fn to_sina_symbol(code: &StockCode) -> String {
    let prefix = match code.exchange() {
        Exchange::Shanghai => "sh",
        Exchange::Shenzhen => "sz",
    };
    format!("{prefix}{}", code.bare())
}

/// Convert back from Sina's symbol format (`sh600519` → `600519.SH`).
///
/// # Errors
/// Returns `InvalidArg` when the prefix is unknown or the code is malformed.
pub fn from_sina_symbol(symbol: &str) -> Result<StockCode, HangqingError> {
    let (prefix, code) = symbol.split_at_checked(2).ok_or_else(|| {
        HangqingError::invalid_arg(format!("malformed sina symbol: {symbol:?}"))
    })?;
    let suffix = match prefix {
        "sh" => "SH",
        "sz" => "SZ",
        _ => {
            return Err(HangqingError::invalid_arg(format!(
                "unknown sina market prefix: {symbol:?}"
            )));
        }
    };
    StockCode::parse(&format!("{code}.{suffix}"))
}

#[async_trait]
impl DataSource for SinaSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_daily(
        &self,
        code: &StockCode,
        range: &DateRange,
    ) -> Result<RawFrame, HangqingError> {
        let url = format!("{}{}", self.base_url, KLINE_PATH);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbol", to_sina_symbol(code).as_str()),
                ("scale", "240"),
                ("ma", "no"),
                ("datalen", "2000"),
            ])
            .timeout(HTTP_TIMEOUT)
            .send()
            .await
            .map_err(|e| transport_err(SOURCE_NAME, &e))?
            .error_for_status()
            .map_err(|e| transport_err(SOURCE_NAME, &e))?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| transport_err(SOURCE_NAME, &e))?;
        let rows = body
            .as_array()
            .ok_or_else(|| HangqingError::transient(SOURCE_NAME, "non-array kline payload"))?;
        if rows.is_empty() {
            return Err(HangqingError::transient(SOURCE_NAME, "empty kline payload"));
        }

        // Keep only rows inside the requested range; the endpoint always
        // serves the latest bars regardless of the request window.
        let in_range: Vec<&Value> = rows
            .iter()
            .filter(|row| {
                row.get("day")
                    .and_then(Value::as_str)
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                    .is_some_and(|d| range.contains(d))
            })
            .collect();
        if in_range.is_empty() {
            return Err(HangqingError::transient(
                SOURCE_NAME,
                format!("no rows between {} and {}", range.start_dashed(), range.end_dashed()),
            ));
        }

        let mut frame = RawFrame::new();
        for field in ["day", "open", "high", "low", "close", "volume"] {
            let values: Vec<RawValue> = in_range
                .iter()
                .map(|row| row.get(field).map_or(RawValue::Null, json_to_raw))
                .collect();
            frame.push_column(field, values)?;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_conversion_round_trips() {
        for input in ["600519", "000001", "510300", "300750"] {
            let code = StockCode::parse(input).unwrap();
            let sina = to_sina_symbol(&code);
            let back = from_sina_symbol(&sina).unwrap();
            assert_eq!(to_sina_symbol(&back), sina);
            assert_eq!(back, code);
        }
    }

    #[test]
    fn shanghai_codes_get_sh_prefix() {
        let code = StockCode::parse("600519").unwrap();
        assert_eq!(to_sina_symbol(&code), "sh600519");
        let code = StockCode::parse("000001").unwrap();
        assert_eq!(to_sina_symbol(&code), "sz000001");
    }

    #[test]
    fn malformed_symbols_are_rejected() {
        assert!(from_sina_symbol("x").is_err());
        assert!(from_sina_symbol("bj430047").is_err());
    }
}
