//! 일별 시세 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - Alpha Vantage 시계열 API 클라이언트 (`provider`)
//! - 반정형 시계열 응답 파서 (`parser`)
//! - 선형 backoff 재시도 (`retry`)
//! - `(symbol, trading_day)` 기준 upsert 저장소 (`storage`)

pub mod error;
pub mod parser;
pub mod provider;
pub mod retry;
pub mod storage;

pub use error::{DataError, FetchError, Result};
pub use parser::parse_daily_series;
pub use provider::{AlphaVantageClient, OutputSize, PriceSource, ProviderConfig};
pub use retry::{fetch_with_retry, FetchOutcome, RetryPolicy};
pub use storage::{MemoryPriceStore, PgPriceWriter, PriceSink};
