//! Fetch one month of daily history with the full fallback chain and print
//! the per-source status table afterwards.
//!
//! Run with: `cargo run --example daily_history`

use std::sync::Arc;

use hangqing::{DateRange, Hangqing};
use hangqing_sources::{EastmoneySource, SinaSource, TencentSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,hangqing=debug
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hangqing=info")),
        )
        .with_target(false)
        .try_init();

    let eastmoney = Arc::new(EastmoneySource::new());
    let hq = Hangqing::builder()
        .with_source(Arc::new(SinaSource::new()))
        .with_source(eastmoney.clone())
        .with_source(Arc::new(TencentSource::new()))
        .with_cache_dir("cache")
        .build()?;

    let range = DateRange::parse("20240101", "20240131")?;
    let series = hq.fetch_stock_data("600519", &range, true).await?;

    println!("{} bars for 600519:", series.len());
    for bar in series.bars().iter().take(5) {
        println!(
            "  {} open {} high {} low {} close {} volume {}",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        );
    }

    println!("{}", hq.source_status());
    Ok(())
}
