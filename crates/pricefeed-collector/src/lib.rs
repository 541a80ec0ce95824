//! Standalone daily price collector.
//!
//! 외부 시세 API에서 심볼별 일별 시세를 가져와 `stock_prices` 테이블에
//! upsert합니다. 실행 주기는 외부 스케줄러나 `daemon` 명령이 결정하며,
//! 이 crate는 한 번의 수집 실행(`Pipeline::run_once`)을 제공합니다.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use pipeline::{build_pipeline, Pipeline, PipelineOptions, RunReport, StoreMode};
pub use stats::RunSummary;
