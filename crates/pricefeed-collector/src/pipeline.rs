//! 수집 파이프라인.
//!
//! 심볼마다 조회(재시도 포함) → 파싱 → upsert를 순서대로 실행하고 결과를
//! 심볼 입력 순서대로 모읍니다.
//!
//! # 심볼별 상태 전이
//!
//! ```text
//! PENDING → FETCHING → (RETRYING)* → PARSED → WRITTEN
//!                                  ↘ FAILED
//! ```
//!
//! 심볼 간 데이터 의존성이 없으므로 `concurrency`만큼 동시에 처리할 수 있으며,
//! 한 심볼의 실패는 다른 심볼에 영향을 주지 않습니다. 실행 전체를 중단하는
//! 경우는 설정 에러(빈 심볼 목록, API 키 누락)뿐입니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt, TryStreamExt};
use pricefeed_core::{ingest_span, normalize_symbol, SymbolResult};
use pricefeed_data::{
    fetch_with_retry, parse_daily_series, AlphaVantageClient, FetchOutcome, MemoryPriceStore,
    PgPriceWriter, PriceSink, PriceSource, ProviderConfig, RetryPolicy,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::{DatabaseConfig, IngestConfig};
use crate::error::CollectorError;
use crate::stats::RunSummary;
use crate::Result;

/// 취소로 조회하지 않은 심볼의 에러 메시지.
pub const CANCELLED_ERROR: &str = "cancelled before fetch";

/// 파이프라인 실행 옵션.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// 조회 재시도 정책
    pub retry: RetryPolicy,
    /// 동시에 처리할 심볼 수 (1이면 순차 처리)
    pub concurrency: usize,
    /// 실행 시간 제한. 초과 시 새 심볼 조회를 시작하지 않음
    pub run_timeout: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            concurrency: 1,
            run_timeout: None,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(ingest: &IngestConfig) -> Self {
        Self {
            retry: ingest.retry_policy(),
            concurrency: ingest.concurrency.max(1),
            run_timeout: ingest.run_timeout(),
        }
    }
}

/// 한 번의 수집 실행 결과.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// 심볼별 결과 (입력 순서)
    pub results: Vec<SymbolResult>,
    /// 집계
    pub summary: RunSummary,
}

/// 저장소 선택.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// PostgreSQL `stock_prices`
    Postgres,
    /// 메모리 저장소 (DB에 쓰지 않음)
    DryRun,
}

/// 심볼별 수집 파이프라인.
pub struct Pipeline {
    source: Arc<dyn PriceSource>,
    sink: Arc<dyn PriceSink>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn PriceSource>,
        sink: Arc<dyn PriceSink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            source,
            sink,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// 심볼 목록 전체를 한 번 수집합니다.
    ///
    /// 모든 심볼에 대해 결과가 하나씩, 입력 순서대로 반환됩니다. 심볼은
    /// 정규화(대문자)된 뒤 조회, 저장, 결과 보고에 같은 값으로 쓰입니다.
    /// 개별 심볼 실패는 해당 결과의 `error`에 기록되며 `Err`는 설정 에러에만
    /// 사용됩니다.
    pub async fn run_once(
        &self,
        symbols: &[String],
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        if symbols.is_empty() {
            return Err(CollectorError::Config("no symbols to ingest".to_string()));
        }

        let start = Instant::now();
        let concurrency = self.options.concurrency.max(1);
        let run_token = cancel.child_token();

        let timer = self.options.run_timeout.map(|timeout| {
            let token = run_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!(
                    timeout_secs = timeout.as_secs_f64(),
                    "실행 시간 초과, 남은 심볼 조회 중단"
                );
                token.cancel();
            })
        });

        info!(
            symbols = symbols.len(),
            concurrency = concurrency,
            source = self.source.name(),
            sink = self.sink.name(),
            "수집 시작"
        );

        // buffered는 완료 순서와 무관하게 입력 순서로 결과를 내보냄
        let collected = stream::iter(symbols)
            .map(|symbol| self.process_symbol(symbol, &run_token))
            .buffered(concurrency)
            .try_collect::<Vec<_>>()
            .await;

        if let Some(timer) = timer {
            timer.abort();
        }

        let results = collected?;
        let summary = RunSummary::from_results(&results, start.elapsed());

        Ok(RunReport { results, summary })
    }

    /// 저장소 연결 정리.
    pub async fn shutdown(&self) {
        self.sink.close().await;
    }

    async fn process_symbol(
        &self,
        raw: &str,
        cancel: &CancellationToken,
    ) -> Result<SymbolResult> {
        let symbol = match normalize_symbol(raw) {
            Ok(symbol) => symbol,
            Err(e) => {
                warn!(symbol = raw, error = %e, "잘못된 심볼, 건너뜀");
                return Ok(SymbolResult::failed(raw, e.to_string()));
            }
        };
        let symbol = symbol.as_str();

        if cancel.is_cancelled() {
            warn!(symbol = symbol, "취소됨, 조회하지 않음");
            return Ok(SymbolResult::failed(symbol, CANCELLED_ERROR));
        }

        self.ingest_symbol(symbol)
            .instrument(ingest_span!("ingest_symbol", symbol))
            .await
    }

    async fn ingest_symbol(&self, symbol: &str) -> Result<SymbolResult> {
        debug!("조회 시작");

        let outcome =
            fetch_with_retry(&self.options.retry, symbol, || self.source.fetch(symbol)).await?;

        let payload = match outcome {
            FetchOutcome::Fetched { payload, attempts } => {
                debug!(attempts = attempts, "조회 완료");
                payload
            }
            FetchOutcome::Exhausted { error, attempts } => {
                error!(attempts = attempts, error = %error, "재시도 소진, 심볼 실패 처리");
                return Ok(SymbolResult::failed(symbol, error));
            }
        };

        let rows = match parse_daily_series(symbol, &payload) {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "응답 파싱 실패");
                return Ok(SymbolResult::failed(symbol, e.to_string()));
            }
        };

        if rows.is_empty() {
            info!("데이터 없음");
            return Ok(SymbolResult::written(symbol, 0));
        }

        match self.sink.upsert(&rows).await {
            Ok(written) => {
                info!(rows = written, "수집 및 저장 완료");
                Ok(SymbolResult::written(symbol, written))
            }
            Err(e) => {
                error!(rows = rows.len(), error = %e, "저장 실패");
                Ok(SymbolResult::failed(symbol, e.to_string()))
            }
        }
    }
}

/// 설정으로 파이프라인을 구성합니다.
///
/// API 키 누락은 DB 연결 전에 설정 에러로 반환됩니다.
pub async fn build_pipeline(
    provider: ProviderConfig,
    database: &DatabaseConfig,
    ingest: &IngestConfig,
    mode: StoreMode,
) -> Result<Pipeline> {
    let source = AlphaVantageClient::new(provider)?;
    info!(function = source.function(), "시세 API 클라이언트 준비 완료");

    let sink: Arc<dyn PriceSink> = match mode {
        StoreMode::Postgres => {
            let writer =
                PgPriceWriter::connect(&database.url, database.max_connections).await?;
            info!("데이터베이스 연결 성공");
            Arc::new(writer)
        }
        StoreMode::DryRun => {
            info!("dry-run 모드: 메모리 저장소 사용");
            Arc::new(MemoryPriceStore::new())
        }
    };

    Ok(Pipeline::new(
        Arc::new(source),
        sink,
        PipelineOptions::from_config(ingest),
    ))
}
