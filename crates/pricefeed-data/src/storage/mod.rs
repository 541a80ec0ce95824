//! 시세 저장소.
//!
//! - `PgPriceWriter`: PostgreSQL `stock_prices` 테이블 upsert
//! - `MemoryPriceStore`: 프로세스 내 저장소 (dry-run, 테스트)
//!
//! 두 구현 모두 `(symbol, trading_day)`가 같은 레코드는 마지막 값으로 덮어쓰며,
//! 반환값은 새로 삽입된 수가 아니라 처리한 레코드 수입니다.

pub mod memory;
pub mod postgres;

pub use memory::MemoryPriceStore;
pub use postgres::PgPriceWriter;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use pricefeed_core::PriceRow;

use crate::error::Result;

/// 일별 시세 upsert trait.
#[async_trait]
pub trait PriceSink: Send + Sync {
    /// 저장소 이름.
    fn name(&self) -> &str;

    /// 레코드 묶음을 하나의 원자적 쓰기로 적용합니다.
    ///
    /// 빈 입력은 저장소에 접근하지 않고 0을 반환합니다.
    async fn upsert(&self, rows: &[PriceRow]) -> Result<usize>;

    /// 보유한 연결을 정리합니다.
    async fn close(&self) {}
}

/// 배치 안에서 같은 키가 여러 번 나오면 마지막 레코드만 남깁니다.
///
/// 남는 레코드는 해당 키가 처음 등장한 위치에 놓입니다.
pub fn dedupe_by_key(rows: &[PriceRow]) -> Vec<&PriceRow> {
    let mut index: HashMap<(&str, NaiveDate), usize> = HashMap::with_capacity(rows.len());
    let mut unique: Vec<&PriceRow> = Vec::with_capacity(rows.len());

    for row in rows {
        match index.get(&row.key()) {
            Some(&pos) => unique[pos] = row,
            None => {
                index.insert(row.key(), unique.len());
                unique.push(row);
            }
        }
    }

    unique
}
