//! 심볼별 수집 결과.

use serde::{Deserialize, Serialize};

/// 한 심볼의 파이프라인 실행 결과.
///
/// 보고/집계 용도로만 사용되며 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolResult {
    /// 티커
    pub symbol: String,
    /// 저장된 레코드 수 (실패 또는 데이터 없음이면 0)
    pub rows_written: usize,
    /// 실패 사유
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SymbolResult {
    /// 저장 성공 결과.
    pub fn written(symbol: impl Into<String>, rows_written: usize) -> Self {
        Self {
            symbol: symbol.into(),
            rows_written,
            error: None,
        }
    }

    /// 실패 결과. 저장 수는 항상 0입니다.
    pub fn failed(symbol: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            rows_written: 0,
            error: Some(error.into()),
        }
    }

    /// 에러 없이 완료되었는지 확인.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
