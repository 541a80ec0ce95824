//! Alpha Vantage 모의 서버를 사용한 수집 파이프라인 통합 테스트.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use mockito::{Matcher, ServerGuard};
use pricefeed_collector::{Pipeline, PipelineOptions};
use pricefeed_core::SymbolResult;
use pricefeed_data::{AlphaVantageClient, MemoryPriceStore, ProviderConfig, RetryPolicy};
use rust_decimal_macros::dec;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn symbol_query(symbol: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("symbol".into(), symbol.into()),
        Matcher::UrlEncoded("apikey".into(), "integration-key".into()),
    ])
}

fn pipeline_for(server: &ServerGuard, store: Arc<MemoryPriceStore>) -> Pipeline {
    let config =
        ProviderConfig::new("integration-key").with_base_url(format!("{}/query", server.url()));
    let client = AlphaVantageClient::new(config).unwrap();

    Pipeline::new(
        Arc::new(client),
        store,
        PipelineOptions {
            retry: RetryPolicy::with_base_delay(Duration::from_millis(5)),
            ..Default::default()
        },
    )
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_run_isolates_provider_error() {
    let mut server = mockito::Server::new_async().await;

    let aapl = server
        .mock("GET", "/query")
        .match_query(symbol_query("AAPL"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "Meta Data": { "2. Symbol": "AAPL" },
                "Time Series (Daily)": {
                    "2024-01-02": {
                        "1. open": "185.0",
                        "2. high": "186.1",
                        "3. low": "183.9",
                        "4. close": "185.6",
                        "5. adjusted close": "185.1",
                        "6. volume": "1000"
                    },
                    "2024-01-03": {
                        "1. open": "184.2",
                        "4. close": "184.25",
                        "6. volume": "1200"
                    }
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let msft = server
        .mock("GET", "/query")
        .match_query(symbol_query("MSFT"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "Error Message": "Invalid API call." }).to_string())
        .expect(3)
        .create_async()
        .await;

    let store = Arc::new(MemoryPriceStore::new());
    let report = pipeline_for(&server, store.clone())
        .run_once(&symbols(&["AAPL", "MSFT"]), &CancellationToken::new())
        .await
        .unwrap();

    aapl.assert_async().await;
    msft.assert_async().await;

    assert_eq!(
        report.results,
        vec![
            SymbolResult::written("AAPL", 2),
            SymbolResult::failed("MSFT", "Provider error: MSFT: Invalid API call."),
        ]
    );
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.failed, 1);

    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let row = store.get("AAPL", day).unwrap();
    assert_eq!(row.high, Some(dec!(186.1)));
    assert_eq!(row.adjusted_close, Some(dec!(185.1)));

    let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let row = store.get("AAPL", day).unwrap();
    assert_eq!(row.high, None);
    assert_eq!(row.adjusted_close, Some(dec!(184.25)));
    assert!(store.rows_for("MSFT").is_empty());
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let mut server = mockito::Server::new_async().await;

    let limited = server
        .mock("GET", "/query")
        .match_query(symbol_query("IBM"))
        .with_status(200)
        .with_body(json!({ "Note": "Thank you for using Alpha Vantage!" }).to_string())
        .expect(3)
        .create_async()
        .await;

    let store = Arc::new(MemoryPriceStore::new());
    let pipeline = pipeline_for(&server, store.clone());
    let report = pipeline
        .run_once(&symbols(&["IBM"]), &CancellationToken::new())
        .await
        .unwrap();

    // 호출마다 같은 응답이므로 재시도 소진
    assert!(report.results[0].error.as_deref().unwrap_or("").starts_with("Rate limited"));
    limited.assert_async().await;
    limited.remove_async().await;

    let ok = server
        .mock("GET", "/query")
        .match_query(symbol_query("IBM"))
        .with_status(200)
        .with_body(
            json!({
                "Time Series (Daily)": {
                    "2024-01-02": { "4. close": "161.5", "5. volume": "42" }
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let report = pipeline
        .run_once(&symbols(&["IBM"]), &CancellationToken::new())
        .await
        .unwrap();

    ok.assert_async().await;
    assert_eq!(report.results, vec![SymbolResult::written("IBM", 1)]);
    assert_eq!(store.rows_for("IBM")[0].volume, 42);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/query")
        .match_query(symbol_query("NVDA"))
        .with_status(200)
        .with_body(
            json!({
                "Time Series (Daily)": {
                    "2024-01-02": { "1. open": "495.2", "4. close": "481.7", "6. volume": "900" },
                    "2024-01-03": { "1. open": "474.9", "4. close": "475.7", "6. volume": "800" }
                }
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let store = Arc::new(MemoryPriceStore::new());
    let pipeline = pipeline_for(&server, store.clone());
    let list = symbols(&["NVDA"]);

    let first = pipeline.run_once(&list, &CancellationToken::new()).await.unwrap();
    let snapshot = store.snapshot();
    let second = pipeline.run_once(&list, &CancellationToken::new()).await.unwrap();

    assert_eq!(first.results, second.results);
    assert_eq!(store.snapshot(), snapshot);
    assert_eq!(store.len(), 2);
}
