use std::sync::{Arc, OnceLock};

use async_trait::async_trait;

use hangqing_core::{
    DataSource, DateRange, Exchange, HangqingError, RawFrame, RawValue, StockCode,
};

const SOURCE_NAME: &str = "juejin";

/// Broker token, set once per process before the first fetch.
static TOKEN: OnceLock<String> = OnceLock::new();

/// Register the broker token. Must be called once per process before any
/// [`JuejinSource`] fetch; later calls are ignored. Returns whether this call
/// set the token.
pub fn authenticate(token: impl Into<String>) -> bool {
    TOKEN.set(token.into()).is_ok()
}

/// Whether a broker token has been registered in this process.
#[must_use]
pub fn is_authenticated() -> bool {
    TOKEN.get().is_some()
}

/// The registered broker token, for adapter implementations to attach to
/// their SDK session.
#[must_use]
pub fn token() -> Option<&'static str> {
    TOKEN.get().map(String::as_str)
}

/// One daily bar as the broker SDK returns it: an end-of-bar timestamp
/// (`eob`, RFC 3339) plus numeric OHLCV fields.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerBar {
    /// End-of-bar timestamp, RFC 3339 with the exchange offset.
    pub eob: String,
    /// Opening price.
    pub open: f64,
    /// Intraday high.
    pub high: f64,
    /// Intraday low.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume.
    pub volume: f64,
}

/// History abstraction over the proprietary broker SDK.
///
/// The SDK binding itself lives outside this workspace; callers supply an
/// implementation wrapping their terminal session (and tests inject stubs).
/// `symbol` is in broker format (`SHSE.600519`), dates are `YYYY-MM-DD`.
#[async_trait]
pub trait BrokerHistoryApi: Send + Sync {
    /// Fetch daily bars for a broker-format symbol and inclusive date range.
    async fn daily_history(
        &self,
        symbol: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<BrokerBar>, HangqingError>;
}

/// Broker SDK source.
///
/// Available only after [`authenticate`] has registered a token; without one
/// the source is skipped from candidate lists without any attempt.
pub struct JuejinSource {
    api: Arc<dyn BrokerHistoryApi>,
}

impl JuejinSource {
    /// Wrap a broker SDK binding.
    pub fn new(api: Arc<dyn BrokerHistoryApi>) -> Self {
        Self { api }
    }
}

/// Convert to the broker's symbol format: uppercase exchange id and a dot
/// (`600519.SH` → `SHSE.600519`, `000001.SZ` → `SZSE.000001`).
#[must_use]
pub fn to_juejin_symbol(code: &StockCode) -> String {
    let exchange = match code.exchange() {
        Exchange::Shanghai => "SHSE",
        Exchange::Shenzhen => "SZSE",
    };
    format!("{exchange}.{}", code.bare())
}

/// Convert back from the broker's symbol format (`SHSE.600519` → `600519.SH`).
///
/// # Errors
/// Returns `InvalidArg` when the exchange id is unknown or the code is
/// malformed.
pub fn from_juejin_symbol(symbol: &str) -> Result<StockCode, HangqingError> {
    let (exchange, code) = symbol
        .split_once('.')
        .ok_or_else(|| HangqingError::invalid_arg(format!("malformed broker symbol: {symbol:?}")))?;
    let suffix = match exchange {
        "SHSE" => "SH",
        "SZSE" => "SZ",
        _ => {
            return Err(HangqingError::invalid_arg(format!(
                "unknown broker exchange: {symbol:?}"
            )));
        }
    };
    StockCode::parse(&format!("{code}.{suffix}"))
}

#[async_trait]
impl DataSource for JuejinSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn is_available(&self) -> bool {
        is_authenticated()
    }

    async fn fetch_daily(
        &self,
        code: &StockCode,
        range: &DateRange,
    ) -> Result<RawFrame, HangqingError> {
        if !is_authenticated() {
            return Err(HangqingError::unavailable(SOURCE_NAME, "token not set"));
        }
        let bars = self
            .api
            .daily_history(
                &to_juejin_symbol(code),
                &range.start_dashed(),
                &range.end_dashed(),
            )
            .await?;
        if bars.is_empty() {
            return Err(HangqingError::transient(SOURCE_NAME, "empty history"));
        }

        let mut frame = RawFrame::new();
        frame.push_column(
            "eob",
            bars.iter().map(|b| RawValue::text(b.eob.clone())).collect(),
        )?;
        let number_col = |get: fn(&BrokerBar) -> f64| -> Vec<RawValue> {
            bars.iter().map(|b| RawValue::Number(get(b))).collect()
        };
        frame.push_column("open", number_col(|b| b.open))?;
        frame.push_column("high", number_col(|b| b.high))?;
        frame.push_column("low", number_col(|b| b.low))?;
        frame.push_column("close", number_col(|b| b.close))?;
        frame.push_column("volume", number_col(|b| b.volume))?;
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
            let symbol = to_juejin_symbol(&code);
            let back = from_juejin_symbol(&symbol).unwrap();
            assert_eq!(to_juejin_symbol(&back), symbol);
            assert_eq!(back, code);
        }
    }

    #[test]
    fn leading_digit_picks_the_exchange_id() {
        assert_eq!(
            to_juejin_symbol(&StockCode::parse("600519").unwrap()),
            "SHSE.600519"
        );
        assert_eq!(
            to_juejin_symbol(&StockCode::parse("300750").unwrap()),
            "SZSE.300750"
        );
    }

    #[test]
    fn malformed_symbols_are_rejected() {
        assert!(from_juejin_symbol("600519").is_err());
        assert!(from_juejin_symbol("BJSE.430047").is_err());
    }
}
