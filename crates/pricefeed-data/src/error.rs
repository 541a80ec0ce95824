//! 데이터 모듈 오류 타입.

use pricefeed_core::CoreError;
use thiserror::Error;

/// 파싱/저장 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 데이터 삽입 오류
    #[error("Insert error: {0}")]
    InsertError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 응답 구조 자체가 잘못된 경우 (개별 항목 오류는 해당 없음)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 잘못된 데이터
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Io(e) => DataError::ConnectionError(e.to_string()),
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<CoreError> for DataError {
    fn from(err: CoreError) -> Self {
        DataError::InvalidData(err.to_string())
    }
}

/// 시세 조회 오류.
///
/// `Config`를 제외한 모든 오류는 심볼 단위로 재시도 대상입니다.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 설정 오류 (API 키 누락 등). 재시도하지 않고 실행 전체를 중단합니다.
    #[error("Configuration error: {0}")]
    Config(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 네트워크/연결 오류
    #[error("Network error: {0}")]
    Network(String),

    /// 2xx가 아닌 HTTP 상태
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 200 응답 본문에 포함된 provider 오류 (`Error Message`)
    #[error("Provider error: {0}")]
    Provider(String),

    /// 200 응답 본문에 포함된 호출 한도 안내 (`Note`, `Information`)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// JSON이 아닌 응답 본문
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        !self.is_config()
    }

    /// 실행 전체를 중단해야 하는 설정 에러인지 확인.
    pub fn is_config(&self) -> bool {
        matches!(self, FetchError::Config(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // URL에는 apikey 쿼리가 포함되므로 메시지에서 제거
        let err = err.without_url();
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
