//! 프로세스 내 시세 저장소.
//!
//! PostgreSQL 저장소와 같은 upsert 규칙을 따릅니다. 수집기의 dry-run 모드와
//! 파이프라인 테스트에서 사용합니다.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use pricefeed_core::PriceRow;

use super::{dedupe_by_key, PriceSink};
use crate::error::{DataError, Result};

type PriceKey = (String, NaiveDate);

/// 메모리 저장소.
#[derive(Debug, Default)]
pub struct MemoryPriceStore {
    rows: RwLock<BTreeMap<PriceKey, PriceRow>>,
    writes: AtomicUsize,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 레코드 수.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 실제로 적용된 배치 쓰기 횟수.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// 키로 레코드 조회.
    pub fn get(&self, symbol: &str, trading_day: NaiveDate) -> Option<PriceRow> {
        self.rows
            .read()
            .ok()?
            .get(&(symbol.to_string(), trading_day))
            .cloned()
    }

    /// 심볼의 레코드 (거래일 오름차순).
    pub fn rows_for(&self, symbol: &str) -> Vec<PriceRow> {
        self.rows
            .read()
            .map(|rows| {
                rows.values()
                    .filter(|row| row.symbol == symbol)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 전체 레코드 (심볼, 거래일 오름차순).
    pub fn snapshot(&self) -> Vec<PriceRow> {
        self.rows
            .read()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PriceSink for MemoryPriceStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, rows: &[PriceRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let unique = dedupe_by_key(rows);
        let mut store = self
            .rows
            .write()
            .map_err(|_| DataError::InsertError("memory store lock poisoned".to_string()))?;

        for row in unique {
            store.insert((row.symbol.clone(), row.trading_day), row.clone());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(rows.len())
    }
}
