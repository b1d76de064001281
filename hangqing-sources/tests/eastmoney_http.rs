use httpmock::prelude::*;
use serde_json::json;

use hangqing_core::{DataSource, DateRange, HangqingError, MacroKind, StockCode, normalize};
use hangqing_sources::EastmoneySource;

const KLINE_PATH: &str = "/api/qt/stock/kline/get";
const MACRO_PATH: &str = "/api/data/v1/get";

#[tokio::test]
async fn klines_surface_under_chinese_column_names() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(KLINE_PATH)
                .query_param("secid", "1.600519")
                .query_param("klt", "101")
                .query_param("beg", "20240101")
                .query_param("end", "20240131");
            then.status(200).json_body(json!({
                "data": {
                    "code": "600519",
                    "klines": [
                        "2024-01-02,1685.00,1690.50,1699.00,1680.10,24024",
                        "2024-01-03,1691.00,1702.00,1705.80,1688.00,26010"
                    ]
                }
            }));
        })
        .await;

    let source = EastmoneySource::with_base_urls(server.base_url(), server.base_url());
    let code = StockCode::parse("600519").unwrap();
    let range = DateRange::parse("20240101", "20240131").unwrap();

    let frame = source.fetch_daily(&code, &range).await.unwrap();
    mock.assert_async().await;

    assert!(frame.column("日期").is_some());
    assert!(frame.column("收盘").is_some());
    assert_eq!(frame.row_count(), 2);

    // The bilingual normalizer turns the native shape into canonical bars.
    let series = normalize(&frame).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.bars()[1].close.to_string(), "1702.00");
    assert_eq!(series.bars()[0].volume, 24024.0);
}

#[tokio::test]
async fn null_data_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(KLINE_PATH);
            then.status(200).json_body(json!({ "data": null }));
        })
        .await;

    let source = EastmoneySource::with_base_urls(server.base_url(), server.base_url());
    let code = StockCode::parse("600519").unwrap();
    let range = DateRange::parse("20240101", "20240131").unwrap();

    assert!(matches!(
        source.fetch_daily(&code, &range).await,
        Err(HangqingError::Transient { .. })
    ));
}

#[tokio::test]
async fn macro_report_rows_become_a_frame() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(MACRO_PATH)
                .query_param("reportName", "RPT_ECONOMY_CPI");
            then.status(200).json_body(json!({
                "result": {
                    "data": [
                        { "REPORT_DATE": "2024-02-01", "NATIONAL_SAME": 102.1 },
                        { "REPORT_DATE": "2024-01-01", "NATIONAL_SAME": 101.8 }
                    ]
                }
            }));
        })
        .await;

    let source = EastmoneySource::with_base_urls(server.base_url(), server.base_url());
    let macro_source = source.as_macro_source().unwrap();

    let frame = macro_source.fetch_macro(MacroKind::Cpi).await.unwrap();
    mock.assert_async().await;

    assert_eq!(frame.row_count(), 2);
    assert!(frame.column("REPORT_DATE").is_some());
    assert!(frame.column("NATIONAL_SAME").is_some());
}

#[tokio::test]
async fn empty_macro_report_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(MACRO_PATH);
            then.status(200).json_body(json!({ "result": { "data": [] } }));
        })
        .await;

    let source = EastmoneySource::with_base_urls(server.base_url(), server.base_url());
    let macro_source = source.as_macro_source().unwrap();

    assert!(macro_source.fetch_macro(MacroKind::Pmi).await.is_err());
}
