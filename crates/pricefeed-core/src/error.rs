//! 핵심 모델 에러 타입.

use thiserror::Error;

/// 모델 검증 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// 비어 있거나 형식이 잘못된 심볼
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// 음수 거래량
    #[error("Invalid volume: {0}")]
    InvalidVolume(i64),
}

/// 핵심 모델 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
