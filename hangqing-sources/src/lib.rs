//! hangqing-sources
//!
//! Concrete `DataSource` implementations for the hangqing workspace:
//!
//! - [`JuejinSource`]: the broker SDK upstream, wrapped behind the
//!   [`juejin::BrokerHistoryApi`] adapter trait with process-wide token
//!   authentication.
//! - [`SinaSource`], [`EastmoneySource`], [`TencentSource`]: public HTTP
//!   kline APIs, each with its own symbol format, date convention, and
//!   native column names. [`EastmoneySource`] additionally serves the macro
//!   report tables (CPI, GDP, PMI, FX).
//!
//! All sources return provider-native [`hangqing_core::RawFrame`]s; schema
//! reconciliation happens centrally in `hangqing-core`'s normalizer.
#![warn(missing_docs)]

/// Eastmoney kline and macro report connector.
pub mod eastmoney;
/// Broker SDK connector and its adapter trait.
pub mod juejin;
/// Sina Finance kline connector.
pub mod sina;
/// Tencent fqkline connector.
pub mod tencent;

mod util;

pub use eastmoney::EastmoneySource;
pub use juejin::JuejinSource;
pub use sina::SinaSource;
pub use tencent::TencentSource;
