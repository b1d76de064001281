use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use hangqing_core::{
    DataSource, DateRange, Exchange, HangqingError, RawFrame, RawValue, StockCode,
};

use crate::util::{HTTP_TIMEOUT, json_to_raw, transport_err};

const SOURCE_NAME: &str = "tencent";
const DEFAULT_BASE_URL: &str = "https://web.ifzq.gtimg.cn";
const KLINE_PATH: &str = "/appstock/app/fqkline/get";

/// Positional layout of one fqkline row.
const KLINE_COLUMNS: &[&str] = &["date", "open", "close", "high", "low", "volume"];

/// Tencent fqkline source.
///
/// Takes dashed `YYYY-MM-DD` date parameters and returns positional row
/// arrays `[date, open, close, high, low, volume]` keyed by symbol; the
/// adjusted series lives under `qfqday`, falling back to `day` when the
/// upstream serves unadjusted bars.
pub struct TencentSource {
    client: Client,
    base_url: String,
}

impl Default for TencentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TencentSource {
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

/// Convert to Tencent's symbol format: lowercase market prefix, no separator
/// (`600519.SH` → `sh600519`).
#[must_use]
pub fn to_tencent_symbol(code: &StockCode) -> String {
    let prefix = match code.exchange() {
        Exchange::Shanghai => "sh",
        Exchange::Shenzhen => "sz",
    };
    format!("{prefix}{}", code.bare())
}

/// Convert back from Tencent's symbol format (`sz000001` → `000001.SZ`).
///
/// # Errors
/// Returns `InvalidArg` when the prefix is unknown or the code is malformed.
pub fn from_tencent_symbol(symbol: &str) -> Result<StockCode, HangqingError> {
    let (prefix, code) = symbol.split_at_checked(2).ok_or_else(|| {
        HangqingError::invalid_arg(format!("malformed tencent symbol: {symbol:?}"))
    })?;
    let suffix = match prefix {
        "sh" => "SH",
        "sz" => "SZ",
        _ => {
            return Err(HangqingError::invalid_arg(format!(
                "unknown tencent market prefix: {symbol:?}"
            )));
        }
    };
    StockCode::parse(&format!("{code}.{suffix}"))
}

#[async_trait]
impl DataSource for TencentSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_daily(
        &self,
        code: &StockCode,
        range: &DateRange,
    ) -> Result<RawFrame, HangqingError> {
        let symbol = to_tencent_symbol(code);
        let url = format!("{}{}", self.base_url, KLINE_PATH);
        let param = format!(
            "{symbol},day,{},{},640,qfq",
            range.start_dashed(),
            range.end_dashed()
        );
        let resp = self
            .client
            .get(&url)
            .query(&[("param", param.as_str())])
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
        let per_symbol = body
            .pointer(&format!("/data/{symbol}"))
            .ok_or_else(|| HangqingError::transient(SOURCE_NAME, "missing symbol data"))?;
        let rows = per_symbol
            .get("qfqday")
            .or_else(|| per_symbol.get("day"))
            .and_then(Value::as_array)
            .ok_or_else(|| HangqingError::transient(SOURCE_NAME, "missing kline rows"))?;
        if rows.is_empty() {
            return Err(HangqingError::transient(SOURCE_NAME, "empty kline payload"));
        }

        let mut columns: Vec<Vec<RawValue>> =
            vec![Vec::with_capacity(rows.len()); KLINE_COLUMNS.len()];
        for row in rows {
            let cells = row
                .as_array()
                .ok_or_else(|| HangqingError::transient(SOURCE_NAME, "non-array kline row"))?;
            for (i, column) in columns.iter_mut().enumerate() {
                column.push(cells.get(i).map_or(RawValue::Null, json_to_raw));
            }
        }

        let mut frame = RawFrame::new();
        for (name, values) in KLINE_COLUMNS.iter().zip(columns) {
            frame.push_column(*name, values)?;
        }
        Ok(frame)
    }
}
