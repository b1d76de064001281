use chrono::NaiveDate;
use thiserror::Error;

/// Unified error type for the hangqing workspace.
///
/// Source-level failures (transport, empty payloads, schema mismatches,
/// timeouts) are converted into fallback-routing decisions by the
/// orchestrator; only total exhaustion or argument problems reach callers.
#[derive(Debug, Error)]
pub enum HangqingError {
    /// A source failed in a way worth retrying: transport error, rate limit,
    /// or an empty response where data was expected.
    #[error("{src} failed: {msg}")]
    Transient {
        /// Source name that failed.
        src: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A source returned a payload whose shape could not be normalized
    /// (no recognizable date column, missing price columns, ...).
    #[error("schema mismatch: {msg}")]
    Schema {
        /// Description of the unrecognized shape.
        msg: String,
    },

    /// An individual source call exceeded the configured timeout.
    #[error("{src} timed out")]
    Timeout {
        /// Source name that timed out.
        src: String,
    },

    /// A source is configured but cannot run (missing credential or
    /// dependency). Skipped silently from the candidate list.
    #[error("{src} unavailable: {reason}")]
    Unavailable {
        /// Source name that is unavailable.
        src: String,
        /// Why the source cannot be used.
        reason: String,
    },

    /// Every candidate source exhausted its attempt budget.
    #[error("all sources failed for {symbol} ({start}..{end})")]
    AllSourcesExhausted {
        /// Requested symbol.
        symbol: String,
        /// Requested range start.
        start: NaiveDate,
        /// Requested range end.
        end: NaiveDate,
        /// Last error recorded per exhausted source.
        errors: Vec<HangqingError>,
    },

    /// The requested capability is not configured (e.g. no macro source).
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// Capability string describing what was requested.
        capability: &'static str,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),
}

impl HangqingError {
    /// Helper: build a `Transient` error with the source name and message.
    pub fn transient(source: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transient {
            src: source.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Schema` error from a description.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema { msg: msg.into() }
    }

    /// Helper: build a `Timeout` error for a source.
    pub fn timeout(source: impl Into<String>) -> Self {
        Self::Timeout {
            src: source.into(),
        }
    }

    /// Helper: build an `Unavailable` error with the source name and reason.
    pub fn unavailable(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            src: source.into(),
            reason: reason.into(),
        }
    }

    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub const fn unsupported(capability: &'static str) -> Self {
        Self::Unsupported { capability }
    }

    /// Helper: build an `InvalidArg` error from a description.
    pub fn invalid_arg(msg: impl Into<String>) -> Self {
        Self::InvalidArg(msg.into())
    }
}
