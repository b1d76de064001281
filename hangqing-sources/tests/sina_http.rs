use httpmock::prelude::*;
use serde_json::json;

use hangqing_core::{DataSource, DateRange, HangqingError, StockCode, normalize};
use hangqing_sources::SinaSource;

const KLINE_PATH: &str = "/quotes_service/api/json_v2.php/CN_MarketData.getKLineData";

fn row(day: &str, close: &str) -> serde_json::Value {
    json!({
        "day": day,
        "open": close,
        "high": close,
        "low": close,
        "close": close,
        "volume": "123456"
    })
}

#[tokio::test]
async fn fetch_filters_to_requested_range() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(KLINE_PATH)
                .query_param("symbol", "sz000001")
                .query_param("scale", "240");
            then.status(200).json_body(json!([
                row("2023-12-29", "9.10"),
                row("2024-01-02", "9.21"),
                row("2024-01-03", "9.35"),
                row("2024-02-01", "9.50"),
            ]));
        })
        .await;

    let source = SinaSource::with_base_url(server.base_url());
    let code = StockCode::parse("000001").unwrap();
    let range = DateRange::parse("20240101", "20240131").unwrap();

    let frame = source.fetch_daily(&code, &range).await.unwrap();
    mock.assert_async().await;

    // Rows outside January are filtered out before the frame is returned.
    assert_eq!(frame.row_count(), 2);
    let series = normalize(&frame).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.bars()[0].date.to_string(), "2024-01-02");
}

#[tokio::test]
async fn empty_payload_is_an_error_not_an_empty_frame() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(KLINE_PATH);
            then.status(200).json_body(json!([]));
        })
        .await;

    let source = SinaSource::with_base_url(server.base_url());
    let code = StockCode::parse("000001").unwrap();
    let range = DateRange::parse("20240101", "20240131").unwrap();

    match source.fetch_daily(&code, &range).await {
        Err(HangqingError::Transient { src, .. }) => assert_eq!(src, "sina"),
        other => panic!("expected transient error, got {other:?}"),
    }
}

#[tokio::test]
async fn out_of_range_only_payload_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(KLINE_PATH);
            then.status(200).json_body(json!([row("2020-05-05", "8.88")]));
        })
        .await;

    let source = SinaSource::with_base_url(server.base_url());
    let code = StockCode::parse("000001").unwrap();
    let range = DateRange::parse("20240101", "20240131").unwrap();

    assert!(source.fetch_daily(&code, &range).await.is_err());
}

#[tokio::test]
async fn http_error_status_is_transient() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(KLINE_PATH);
            then.status(502);
        })
        .await;

    let source = SinaSource::with_base_url(server.base_url());
    let code = StockCode::parse("000001").unwrap();
    let range = DateRange::parse("20240101", "20240131").unwrap();

    assert!(matches!(
        source.fetch_daily(&code, &range).await,
        Err(HangqingError::Transient { .. })
    ));
}
