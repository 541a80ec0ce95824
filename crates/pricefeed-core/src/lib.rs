//! # PriceFeed Core
//!
//! 일별 주가 수집 파이프라인의 핵심 모델과 공통 인프라를 제공합니다.
//!
//! - 정규화된 일별 시세 레코드 (`PriceRow`)
//! - 심볼 정규화
//! - 심볼별 수집 결과 (`SymbolResult`)
//! - 에러 타입
//! - 로깅 인프라

pub mod error;
pub mod logging;
pub mod types;

pub use error::*;
pub use logging::*;
pub use types::*;
