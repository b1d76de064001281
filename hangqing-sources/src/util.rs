use serde_json::Value;

use hangqing_core::{HangqingError, RawValue};

/// Default timeout for one upstream HTTP call, independent of retry timing.
pub(crate) const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

/// Map a JSON cell to a raw cell, keeping strings verbatim.
pub(crate) fn json_to_raw(value: &Value) -> RawValue {
    match value {
        Value::String(s) => RawValue::text(s.clone()),
        Value::Number(n) => n.as_f64().map_or(RawValue::Null, RawValue::Number),
        _ => RawValue::Null,
    }
}

/// Map a transport error onto the workspace taxonomy: timeouts stay
/// distinguishable, everything else is transient.
pub(crate) fn transport_err(source: &'static str, err: &reqwest::Error) -> HangqingError {
    if err.is_timeout() {
        HangqingError::timeout(source)
    } else {
        HangqingError::transient(source, err.to_string())
    }
}
