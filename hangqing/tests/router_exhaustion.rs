use std::time::Duration;

use chrono::NaiveDate;

use hangqing::{DateRange, Hangqing, HangqingError};
use hangqing_mock::{MockSource, fixtures};

fn range() -> DateRange {
    DateRange::parse("20240101", "20240131").unwrap()
}

#[tokio::test]
async fn exhaustion_reports_every_source_and_counts_attempts() {
    let a = MockSource::builder("a").fails().build();
    let b = MockSource::builder("b").fails().build();

    let hq = Hangqing::builder()
        .with_source(a.clone())
        .with_source(b.clone())
        .max_retries(2)
        .retry_delay(Duration::from_millis(1), Duration::from_millis(2))
        .build()
        .unwrap();

    let err = hq
        .fetch_stock_data("600519", &range(), false)
        .await
        .unwrap_err();

    match err {
        HangqingError::AllSourcesExhausted {
            symbol,
            start,
            end,
            errors,
        } => {
            assert_eq!(symbol, "600519.SH");
            assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
            assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
            assert_eq!(errors.len(), 2);
        }
        other => panic!("expected AllSourcesExhausted, got {other:?}"),
    }

    // Each source burned its full attempt budget (2 retries = 3 attempts).
    assert_eq!(a.calls(), 3);
    assert_eq!(b.calls(), 3);
    let report = hq.source_status();
    assert_eq!(report.rows()[0].failure, 3);
    assert_eq!(report.rows()[1].failure, 3);
    assert_eq!(hq.last_success_source(), None);
}

#[tokio::test]
async fn fail_fast_without_auto_fallback() {
    let a = MockSource::builder("a").fails().build();
    let b = MockSource::builder("b")
        .returns_frame(fixtures::daily_frame(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            5,
        ))
        .build();

    let hq = Hangqing::builder()
        .with_source(a.clone())
        .with_source(b.clone())
        .auto_fallback(false)
        .max_retries(1)
        .retry_delay(Duration::from_millis(1), Duration::from_millis(2))
        .build()
        .unwrap();

    let err = hq
        .fetch_stock_data("600519", &range(), false)
        .await
        .unwrap_err();

    // The first source's final error propagates; B is never attempted.
    assert!(matches!(err, HangqingError::Transient { .. }));
    assert_eq!(a.calls(), 2);
    assert_eq!(b.calls(), 0);
}

#[tokio::test]
async fn retries_within_one_source_then_succeeds() {
    let frame = fixtures::daily_frame(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 5);
    let a = MockSource::builder("a")
        .with_steps(vec![
            Err(HangqingError::transient("a", "connection reset")),
            Err(HangqingError::transient("a", "rate limited")),
            Ok(frame),
        ])
        .build();

    let hq = Hangqing::builder()
        .with_source(a.clone())
        .max_retries(3)
        .retry_delay(Duration::from_millis(1), Duration::from_millis(2))
        .build()
        .unwrap();

    let series = hq.fetch_stock_data("600519", &range(), false).await.unwrap();
    assert_eq!(series.len(), 5);
    assert_eq!(a.calls(), 3);

    let report = hq.source_status();
    assert_eq!(report.rows()[0].failure, 2);
    assert_eq!(report.rows()[0].success, 1);
    assert_eq!(hq.last_success_source(), Some("a"));
}

#[tokio::test]
async fn slow_source_times_out_and_falls_back() {
    let slow = MockSource::builder("slow")
        .delay(Duration::from_millis(200))
        .returns_frame(fixtures::daily_frame(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            5,
        ))
        .build();
    let fast = MockSource::builder("fast")
        .returns_frame(fixtures::daily_frame(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            5,
        ))
        .build();

    let hq = Hangqing::builder()
        .with_source(slow.clone())
        .with_source(fast.clone())
        .max_retries(0)
        .retry_delay(Duration::from_millis(1), Duration::from_millis(2))
        .call_timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let series = hq.fetch_stock_data("600519", &range(), false).await.unwrap();
    assert_eq!(series.len(), 5);
    assert_eq!(hq.last_success_source(), Some("fast"));
    assert_eq!(hq.source_status().rows()[0].failure, 1);
}

#[test]
fn build_rejects_empty_source_list() {
    assert!(Hangqing::builder().build().is_err());
}

#[test]
fn build_rejects_inverted_retry_delay() {
    let a = MockSource::builder("a").fails().build();
    let result = Hangqing::builder()
        .with_source(a)
        .retry_delay(Duration::from_secs(2), Duration::from_secs(1))
        .build();
    assert!(result.is_err());
}
