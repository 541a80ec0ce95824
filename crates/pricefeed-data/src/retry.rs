//! 선형 backoff 재시도.
//!
//! 조회 실패 시 `base_delay * attempt`만큼 대기한 뒤 다시 시도합니다.
//! 기본값(3회, 5초)에서는 2번째 시도 전 5초, 3번째 시도 전 10초를 대기하며
//! 마지막 시도가 실패한 뒤에는 대기하지 않습니다.
//!
//! 재시도를 모두 소진해도 에러를 반환하지 않고 [`FetchOutcome::Exhausted`]를
//! 돌려주므로, 호출자는 해당 심볼만 실패로 기록하고 나머지를 계속 처리할 수
//! 있습니다. 설정 에러는 재시도 없이 즉시 `Err`로 반환됩니다.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::FetchError;

/// 기본 최대 시도 횟수.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 기본 backoff 단위.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);

/// 재시도 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// backoff 단위
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// 기본 시도 횟수와 지정한 backoff 단위로 정책을 생성합니다.
    pub fn with_base_delay(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Default::default()
        }
    }

    /// `attempt`번째 시도가 실패한 뒤 다음 시도 전까지의 대기 시간.
    ///
    /// 곱셈이 넘치면 `Duration::MAX`로 고정됩니다.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// 한 심볼이 모든 재시도를 소진할 때까지의 총 대기 시간.
    pub fn worst_case_wait(&self) -> Duration {
        let n = self.max_attempts.max(1);
        self.base_delay.saturating_mul((n - 1).saturating_mul(n) / 2)
    }
}

/// 재시도를 포함한 조회 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 조회 성공
    Fetched { payload: Value, attempts: u32 },
    /// 재시도 소진. 마지막 에러 메시지를 보관합니다.
    Exhausted { error: String, attempts: u32 },
}

impl FetchOutcome {
    /// 실제 시도 횟수.
    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Fetched { attempts, .. } | FetchOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// 재시도 정책에 따라 조회를 실행합니다.
///
/// - 성공: `Ok(FetchOutcome::Fetched)`
/// - 재시도 소진: `Ok(FetchOutcome::Exhausted)`
/// - 재시도 불가 에러(설정 에러): `Err`
pub async fn fetch_with_retry<F, Fut>(
    policy: &RetryPolicy,
    symbol: &str,
    mut fetch: F,
) -> Result<FetchOutcome, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match fetch().await {
            Ok(payload) => {
                if attempt > 1 {
                    info!(symbol = symbol, attempt = attempt, "재시도 후 조회 성공");
                }
                return Ok(FetchOutcome::Fetched {
                    payload,
                    attempts: attempt,
                });
            }
            Err(e) if !e.is_retryable() => {
                error!(symbol = symbol, error = %e, "재시도 불가 에러, 즉시 중단");
                return Err(e);
            }
            Err(e) => {
                warn!(
                    symbol = symbol,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %e,
                    "조회 실패"
                );

                if attempt >= max_attempts {
                    return Ok(FetchOutcome::Exhausted {
                        error: e.to_string(),
                        attempts: attempt,
                    });
                }

                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
        }
    }
}
