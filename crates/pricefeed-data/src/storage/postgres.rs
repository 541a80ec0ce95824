//! PostgreSQL 시세 저장소.
//!
//! 한 번의 `upsert` 호출은 하나의 트랜잭션입니다. 배치 전체가 반영되거나
//! 전혀 반영되지 않으며, 충돌 시 모든 값 컬럼을 새 값으로 덮어씁니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pricefeed_core::PriceRow;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use super::{dedupe_by_key, PriceSink};
use crate::error::{DataError, Result};

/// 테이블 생성 SQL.
pub const CREATE_TABLE_SQL: &str = include_str!("../../migrations/0001_create_stock_prices.sql");

/// 한 문장에 바인딩할 최대 레코드 수.
const CHUNK_SIZE: usize = 500;

const UPSERT_SQL: &str = r#"
    INSERT INTO stock_prices
        (symbol, trading_day, open, high, low, close, adjusted_close, volume)
    SELECT * FROM UNNEST(
        $1::text[], $2::date[],
        $3::numeric[], $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[],
        $8::bigint[]
    )
    ON CONFLICT (symbol, trading_day) DO UPDATE SET
        open = EXCLUDED.open,
        high = EXCLUDED.high,
        low = EXCLUDED.low,
        close = EXCLUDED.close,
        adjusted_close = EXCLUDED.adjusted_close,
        volume = EXCLUDED.volume,
        updated_at = NOW()
"#;

/// 저장된 시세 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct StoredPriceRecord {
    pub symbol: String,
    pub trading_day: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub adjusted_close: Option<Decimal>,
    pub volume: i64,
    pub updated_at: DateTime<Utc>,
}

impl StoredPriceRecord {
    /// 도메인 레코드로 변환.
    pub fn to_row(&self) -> PriceRow {
        PriceRow {
            symbol: self.symbol.clone(),
            trading_day: self.trading_day,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            adjusted_close: self.adjusted_close,
            volume: self.volume,
        }
    }
}

/// `stock_prices` upsert 저장소.
#[derive(Clone)]
pub struct PgPriceWriter {
    pool: PgPool,
}

impl PgPriceWriter {
    /// 기존 연결 풀로 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 새 연결 풀을 열어 생성.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }

    /// 연결 풀.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 테이블이 없으면 생성합니다.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        info!("stock_prices 테이블 확인 완료");
        Ok(())
    }

    /// 심볼별 저장된 레코드 수.
    pub async fn count_rows(&self, symbol: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_prices WHERE symbol = $1")
                .bind(symbol)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// 심볼의 저장된 레코드 조회 (거래일 오름차순).
    pub async fn fetch_symbol(&self, symbol: &str) -> Result<Vec<StoredPriceRecord>> {
        let records = sqlx::query_as(
            r#"
            SELECT symbol, trading_day, open, high, low, close, adjusted_close, volume, updated_at
            FROM stock_prices
            WHERE symbol = $1
            ORDER BY trading_day ASC
            "#,
        )
        .bind(symbol)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[async_trait]
impl PriceSink for PgPriceWriter {
    fn name(&self) -> &str {
        "postgres"
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn upsert(&self, rows: &[PriceRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let unique = dedupe_by_key(rows);
        if unique.len() < rows.len() {
            debug!(
                submitted = rows.len(),
                unique = unique.len(),
                "배치 내 중복 키 병합"
            );
        }

        // 에러로 조기 반환되면 drop 시 롤백되고 연결은 풀로 반환됨
        let mut tx = self.pool.begin().await?;

        for chunk in unique.chunks(CHUNK_SIZE) {
            let symbols: Vec<&str> = chunk.iter().map(|r| r.symbol.as_str()).collect();
            let days: Vec<NaiveDate> = chunk.iter().map(|r| r.trading_day).collect();
            let opens: Vec<Option<Decimal>> = chunk.iter().map(|r| r.open).collect();
            let highs: Vec<Option<Decimal>> = chunk.iter().map(|r| r.high).collect();
            let lows: Vec<Option<Decimal>> = chunk.iter().map(|r| r.low).collect();
            let closes: Vec<Option<Decimal>> = chunk.iter().map(|r| r.close).collect();
            let adjusted: Vec<Option<Decimal>> = chunk.iter().map(|r| r.adjusted_close).collect();
            let volumes: Vec<i64> = chunk.iter().map(|r| r.volume).collect();

            sqlx::query(UPSERT_SQL)
                .bind(&symbols)
                .bind(&days)
                .bind(&opens)
                .bind(&highs)
                .bind(&lows)
                .bind(&closes)
                .bind(&adjusted)
                .bind(&volumes)
                .execute(&mut *tx)
                .await
                .map_err(|e| DataError::InsertError(e.to_string()))?;
        }

        tx.commit().await?;

        info!(
            submitted = rows.len(),
            unique = unique.len(),
            "시세 upsert 완료"
        );

        Ok(rows.len())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
