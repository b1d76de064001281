use std::time::Duration;

use chrono::NaiveDate;

use hangqing::{DateRange, Hangqing, HangqingError, RawFrame, RawValue};
use hangqing_mock::{MockSource, fixtures};

fn range() -> DateRange {
    DateRange::parse("20240101", "20240131").unwrap()
}

fn good_frame() -> RawFrame {
    fixtures::daily_frame(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 5)
}

fn fast(builder: hangqing::HangqingBuilder) -> hangqing::HangqingBuilder {
    builder
        .max_retries(0)
        .retry_delay(Duration::from_millis(1), Duration::from_millis(2))
}

#[tokio::test]
async fn falls_back_and_short_circuits() {
    let a = MockSource::builder("a").fails().build();
    let b = MockSource::builder("b").returns_frame(good_frame()).build();
    let c = MockSource::builder("c").returns_frame(good_frame()).build();

    let hq = fast(Hangqing::builder())
        .with_source(a.clone())
        .with_source(b.clone())
        .with_source(c.clone())
        .build()
        .unwrap();

    let series = hq.fetch_stock_data("600519", &range(), false).await.unwrap();
    assert_eq!(series.len(), 5);

    // A was tried and failed, B served, C was never consulted.
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
    assert_eq!(c.calls(), 0);
    assert_eq!(hq.last_success_source(), Some("b"));
}

#[tokio::test]
async fn empty_frame_counts_as_failure_not_success() {
    let a = MockSource::builder("a")
        .returns_frame(fixtures::empty_frame())
        .build();
    let b = MockSource::builder("b").returns_frame(good_frame()).build();

    let hq = fast(Hangqing::builder())
        .with_source(a.clone())
        .with_source(b.clone())
        .build()
        .unwrap();

    let series = hq.fetch_stock_data("600519", &range(), false).await.unwrap();
    assert_eq!(series.len(), 5);
    assert_eq!(a.calls(), 1);

    let report = hq.source_status();
    assert_eq!(report.rows()[0].failure, 1);
    assert_eq!(report.rows()[1].success, 1);
}

#[tokio::test]
async fn unavailable_source_is_skipped_with_zero_attempts() {
    let a = MockSource::builder("a").unavailable().fails().build();
    let b = MockSource::builder("b").returns_frame(good_frame()).build();

    let hq = fast(Hangqing::builder())
        .with_source(a.clone())
        .with_source(b.clone())
        .build()
        .unwrap();

    hq.fetch_stock_data("600519", &range(), false).await.unwrap();

    assert_eq!(a.calls(), 0);
    let report = hq.source_status();
    assert_eq!(report.rows()[0].success, 0);
    assert_eq!(report.rows()[0].failure, 0);
}

#[tokio::test]
async fn disabled_source_is_never_tried() {
    let a = MockSource::builder("a").returns_frame(good_frame()).build();
    let b = MockSource::builder("b").returns_frame(good_frame()).build();

    let hq = fast(Hangqing::builder())
        .with_disabled_source(a.clone())
        .with_source(b.clone())
        .build()
        .unwrap();

    hq.fetch_stock_data("600519", &range(), false).await.unwrap();
    assert_eq!(a.calls(), 0);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn unrecognizable_schema_routes_to_next_source() {
    let mut bogus = RawFrame::new();
    bogus
        .push_column("something", vec![RawValue::text("2024-01-02")])
        .unwrap();
    let a = MockSource::builder("a").returns_frame(bogus).build();
    let b = MockSource::builder("b").returns_frame(good_frame()).build();

    let hq = fast(Hangqing::builder())
        .with_source(a.clone())
        .with_source(b.clone())
        .build()
        .unwrap();

    let series = hq.fetch_stock_data("600519", &range(), false).await.unwrap();
    assert_eq!(series.len(), 5);
    assert_eq!(a.calls(), 1);
}

#[tokio::test]
async fn malformed_symbol_is_rejected_before_any_source_call() {
    let a = MockSource::builder("a").returns_frame(good_frame()).build();
    let hq = fast(Hangqing::builder())
        .with_source(a.clone())
        .build()
        .unwrap();

    let err = hq
        .fetch_stock_data("not-a-code", &range(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, HangqingError::InvalidArg(_)));
    assert_eq!(a.calls(), 0);
}
