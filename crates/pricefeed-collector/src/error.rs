//! 에러 타입 정의.

use std::fmt;

use pricefeed_core::CoreError;
use pricefeed_data::{DataError, FetchError};

/// Collector 에러 타입
///
/// 심볼 단위 에러는 `SymbolResult`에 기록되고 여기까지 올라오지 않습니다.
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러 (API 키 누락, 빈 심볼 목록 등). 실행 전체를 중단합니다.
    Config(String),
    /// 저장소 에러 (연결, 스키마)
    Data(DataError),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Data(e) => write!(f, "Data error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Data(err)
    }
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

/// 실행 단위로 전파되는 조회 에러는 재시도 불가 에러(설정 에러)뿐입니다.
impl From<FetchError> for CollectorError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Config(msg) => Self::Config(msg),
            other => Self::Config(other.to_string()),
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
