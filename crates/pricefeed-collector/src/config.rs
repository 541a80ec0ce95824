//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use pricefeed_core::parse_symbol_list;
use pricefeed_data::provider::alpha_vantage::{DEFAULT_BASE_URL, DEFAULT_FUNCTION};
use pricefeed_data::{OutputSize, ProviderConfig, RetryPolicy};
use secrecy::SecretString;

use crate::error::CollectorError;
use crate::Result;

/// 기본 수집 심볼.
const DEFAULT_SYMBOLS: &str = "AAPL,MSFT";

/// Collector 전체 설정
#[derive(Debug)]
pub struct CollectorConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 시세 API 설정
    pub provider: ProviderConfig,
    /// 수집 대상 심볼 (정규화 완료)
    pub symbols: Vec<String>,
    /// 수집 실행 설정
    pub ingest: IngestConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 데이터베이스 설정
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL URL
    pub url: String,
    /// 최대 연결 수
    pub max_connections: u32,
}

/// 수집 실행 설정
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// 선형 backoff 단위 (초)
    pub retry_base_secs: u64,
    /// 동시에 처리할 심볼 수 (1이면 순차 처리)
    pub concurrency: usize,
    /// 실행 시간 제한 (초). 초과 시 남은 심볼은 조회하지 않음
    pub run_timeout_secs: Option<u64>,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 수집 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (`.env` 포함)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let symbols_raw = lookup("STOCK_SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string());
        let symbols = parse_symbol_list(&symbols_raw)?;
        if symbols.is_empty() {
            return Err(CollectorError::Config(
                "No symbols configured via STOCK_SYMBOLS".to_string(),
            ));
        }

        let output_size = match lookup("ALPHAVANTAGE_OUTPUTSIZE") {
            Some(value) => value.parse::<OutputSize>().map_err(CollectorError::Config)?,
            None => OutputSize::default(),
        };

        let provider = ProviderConfig {
            base_url: lookup("ALPHAVANTAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: lookup("ALPHAVANTAGE_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            function: lookup("ALPHAVANTAGE_FUNCTION")
                .unwrap_or_else(|| DEFAULT_FUNCTION.to_string()),
            output_size,
            timeout: Duration::from_secs(parse_or(&lookup, "ALPHAVANTAGE_TIMEOUT_SECS", 30)),
        };

        Ok(Self {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or_else(|| build_pg_url(&lookup)),
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5),
            },
            provider,
            symbols,
            ingest: IngestConfig {
                retry_base_secs: parse_or(&lookup, "INGEST_RETRY_BASE_SECS", 5),
                concurrency: parse_or(&lookup, "INGEST_CONCURRENCY", 1),
                run_timeout_secs: lookup("INGEST_RUN_TIMEOUT_SECS").and_then(|v| v.parse().ok()),
            },
            daemon: DaemonConfig {
                interval_minutes: parse_or(&lookup, "DAEMON_INTERVAL_MINUTES", 1440),
            },
        })
    }
}

impl IngestConfig {
    /// 재시도 정책
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_base_delay(Duration::from_secs(self.retry_base_secs))
    }

    /// 실행 시간 제한을 Duration으로 반환
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

impl DaemonConfig {
    /// 수집 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1).saturating_mul(60))
    }
}

/// 개별 POSTGRES_* 변수로 URL 구성
fn build_pg_url<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
    format!(
        "postgres://{}:{}@{}:{}/{}",
        var("POSTGRES_USER", "stockuser"),
        var("POSTGRES_PASSWORD", "stockpass"),
        var("POSTGRES_HOST", "postgres"),
        var("POSTGRES_PORT", "5432"),
        var("POSTGRES_DB", "stocks"),
    )
}

/// 값을 파싱 (없거나 실패 시 기본값 사용)
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
