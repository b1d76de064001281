//! hangqing-core
//!
//! Core types, traits, and normalization shared across the hangqing workspace.
//!
//! - `types`: canonical data structures (codes, ranges, bars, series, config).
//! - `frame`: provider-native tabular payloads (`RawFrame`).
//! - `source`: the `DataSource` trait and the `MacroSource` role trait.
//! - `normalize`: alias tables mapping any source's shape to the canonical
//!   daily schema.
//! - `stats`: atomic per-source success/failure counters.
#![warn(missing_docs)]

/// Workspace error taxonomy.
pub mod error;
/// Provider-native tabular payloads.
pub mod frame;
/// Schema normalization into the canonical daily series.
pub mod normalize;
/// Source capability traits.
pub mod source;
/// Per-source success/failure counters.
pub mod stats;
pub mod types;

pub use error::HangqingError;
pub use frame::{RawColumn, RawFrame, RawValue};
pub use normalize::normalize;
pub use source::{DataSource, MacroSource};
pub use stats::{SourceStats, SourceStatusReport, SourceStatusRow};
pub use types::*;
