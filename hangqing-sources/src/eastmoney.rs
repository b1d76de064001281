use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use hangqing_core::{
    DataSource, DateRange, Exchange, HangqingError, MacroKind, MacroSource, RawFrame, RawValue,
    StockCode,
};

use crate::util::{HTTP_TIMEOUT, json_to_raw, transport_err};

const SOURCE_NAME: &str = "eastmoney";
const DEFAULT_KLINE_BASE_URL: &str = "https://push2his.eastmoney.com";
const DEFAULT_MACRO_BASE_URL: &str = "https://datacenter-web.eastmoney.com";
const KLINE_PATH: &str = "/api/qt/stock/kline/get";
const MACRO_PATH: &str = "/api/data/v1/get";

/// Native column names of one kline row, in upstream field order
/// (f51..f56 = date, open, close, high, low, volume).
const KLINE_COLUMNS: &[&str] = &["日期", "开盘", "收盘", "最高", "最低", "成交量"];

/// Eastmoney kline and macro-report source.
///
/// Klines are requested with compact `YYYYMMDD` date parameters and arrive as
/// comma-joined row strings; the frame is exposed under the upstream's
/// Chinese column names. The macro role serves the economy report tables
/// (CPI, GDP, PMI, FX) from the datacenter API.
pub struct EastmoneySource {
    client: Client,
    kline_base_url: String,
    macro_base_url: String,
}

impl Default for EastmoneySource {
    fn default() -> Self {
        Self::new()
    }
}

impl EastmoneySource {
    /// Build a source against the production endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_KLINE_BASE_URL, DEFAULT_MACRO_BASE_URL)
    }

    /// Build a source against custom endpoints (tests point these at a local
    /// mock server).
    pub fn with_base_urls(
        kline_base_url: impl Into<String>,
        macro_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            kline_base_url: kline_base_url.into(),
            macro_base_url: macro_base_url.into(),
        }
    }

    const fn macro_report_name(kind: MacroKind) -> &'static str {
        match kind {
            MacroKind::Cpi => "RPT_ECONOMY_CPI",
            MacroKind::Gdp => "RPT_ECONOMY_GDP",
            MacroKind::Pmi => "RPT_ECONOMY_PMI",
            MacroKind::Fx => "RPT_EXCHANGE_RATE",
            // `MacroKind` is `#[non_exhaustive]`; all current variants are
            // handled above. This arm only satisfies cross-crate exhaustiveness.
            _ => unreachable!(),
        }
    }
}

/// Convert to Eastmoney's secid format: numeric market prefix and a dot
/// (`600519.SH` → `1.600519`, `000001.SZ` → `0.000001`).
#[must_use]
pub fn to_secid(code: &StockCode) -> String {
    let market = match code.exchange() {
        Exchange::Shanghai => '1',
        Exchange::Shenzhen => '0',
    };
    format!("{market}.{}", code.bare())
}

/// Convert back from a secid (`1.600519` → `600519.SH`).
///
/// # Errors
/// Returns `InvalidArg` when the market digit is unknown or the code is
/// malformed.
pub fn from_secid(secid: &str) -> Result<StockCode, HangqingError> {
    let (market, code) = secid
        .split_once('.')
        .ok_or_else(|| HangqingError::invalid_arg(format!("malformed secid: {secid:?}")))?;
    let suffix = match market {
        "1" => "SH",
        "0" => "SZ",
        _ => {
            return Err(HangqingError::invalid_arg(format!(
                "unknown secid market: {secid:?}"
            )));
        }
    };
    StockCode::parse(&format!("{code}.{suffix}"))
}

#[async_trait]
impl DataSource for EastmoneySource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_daily(
        &self,
        code: &StockCode,
        range: &DateRange,
    ) -> Result<RawFrame, HangqingError> {
        let url = format!("{}{}", self.kline_base_url, KLINE_PATH);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("secid", to_secid(code).as_str()),
                ("fields1", "f1,f2,f3,f4,f5,f6"),
                ("fields2", "f51,f52,f53,f54,f55,f56"),
                // klt=101: daily bars; fqt=1: forward-adjusted prices.
                ("klt", "101"),
                ("fqt", "1"),
                ("beg", range.start_compact().as_str()),
                ("end", range.end_compact().as_str()),
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
        let klines = body
            .pointer("/data/klines")
            .and_then(Value::as_array)
            .ok_or_else(|| HangqingError::transient(SOURCE_NAME, "missing kline data"))?;
        if klines.is_empty() {
            return Err(HangqingError::transient(SOURCE_NAME, "empty kline payload"));
        }

        // Each kline is one comma-joined row string.
        let mut columns: Vec<Vec<RawValue>> = vec![Vec::with_capacity(klines.len()); KLINE_COLUMNS.len()];
        for line in klines {
            let line = line
                .as_str()
                .ok_or_else(|| HangqingError::transient(SOURCE_NAME, "non-string kline row"))?;
            let mut cells = line.split(',');
            for column in &mut columns {
                column.push(cells.next().map_or(RawValue::Null, RawValue::text));
            }
        }

        let mut frame = RawFrame::new();
        for (name, values) in KLINE_COLUMNS.iter().zip(columns) {
            frame.push_column(*name, values)?;
        }
        Ok(frame)
    }

    fn as_macro_source(&self) -> Option<&dyn MacroSource> {
        Some(self)
    }
}

#[async_trait]
impl MacroSource for EastmoneySource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_macro(&self, kind: MacroKind) -> Result<RawFrame, HangqingError> {
        let url = format!("{}{}", self.macro_base_url, MACRO_PATH);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("reportName", Self::macro_report_name(kind)),
                ("columns", "ALL"),
                ("pageSize", "500"),
                ("sortColumns", "REPORT_DATE"),
                ("sortTypes", "-1"),
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
            .pointer("/result/data")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                HangqingError::transient(SOURCE_NAME, format!("missing {kind} report data"))
            })?;
        let objects: Vec<&serde_json::Map<String, Value>> =
            rows.iter().filter_map(Value::as_object).collect();
        if objects.is_empty() {
            return Err(HangqingError::transient(
                SOURCE_NAME,
                format!("empty {kind} report"),
            ));
        }

        let mut frame = RawFrame::new();
        for key in objects[0].keys() {
            let values: Vec<RawValue> = objects
                .iter()
                .map(|row| row.get(key).map_or(RawValue::Null, json_to_raw))
                .collect();
            frame.push_column(key.clone(), values)?;
        }
        Ok(frame)
    }
}
