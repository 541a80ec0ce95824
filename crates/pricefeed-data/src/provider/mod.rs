//! 시세 Provider 모듈.
//!
//! ## Alpha Vantage
//! - `AlphaVantageClient`: 일별/주별 시계열 API 클라이언트 (API 키 필요)
//! - 200 응답에 담긴 오류/호출 한도 안내를 별도 에러로 분류

pub mod alpha_vantage;

pub use alpha_vantage::{AlphaVantageClient, OutputSize, ProviderConfig};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;

/// 심볼 단위 시계열 조회 trait.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 한 심볼의 원본 응답 조회. 요청 한 번을 수행합니다.
    async fn fetch(&self, symbol: &str) -> Result<Value, FetchError>;
}
