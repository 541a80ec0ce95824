//! 수집 통계 구조체.

use pricefeed_core::SymbolResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::pipeline::CANCELLED_ERROR;

/// 수집 실행 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 총 심볼 수
    pub total: usize,
    /// 성공 횟수 (데이터 없음 포함)
    pub succeeded: usize,
    /// 실패 횟수
    pub failed: usize,
    /// 빈 데이터 (조회 성공, 데이터 없음)
    pub empty: usize,
    /// 취소되어 조회하지 않은 심볼 수
    pub cancelled: usize,
    /// 저장된 총 레코드 수
    pub rows_written: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunSummary {
    /// 심볼별 결과로부터 통계 집계
    pub fn from_results(results: &[SymbolResult], elapsed: Duration) -> Self {
        let mut summary = Self {
            elapsed,
            ..Default::default()
        };

        for result in results {
            summary.total += 1;
            match result.error.as_deref() {
                None => {
                    summary.succeeded += 1;
                    summary.rows_written += result.rows_written;
                    if result.rows_written == 0 {
                        summary.empty += 1;
                    }
                }
                Some(CANCELLED_ERROR) => summary.cancelled += 1,
                Some(_) => summary.failed += 1,
            }
        }

        summary
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }

    /// 일부 심볼이 실패하거나 취소되었는지 확인
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.cancelled > 0
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            succeeded = self.succeeded,
            failed = self.failed,
            empty = self.empty,
            cancelled = self.cancelled,
            rows_written = self.rows_written,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
