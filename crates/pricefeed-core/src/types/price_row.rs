//! 일별 시세 레코드.
//!
//! 한 심볼의 한 거래일 OHLCV를 나타냅니다. `(symbol, trading_day)`가
//! 자연키이며, 같은 키로 다시 저장하면 기존 값을 덮어씁니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::symbol::normalize_symbol;
use crate::error::{CoreError, CoreResult};

/// 정규화된 일별 시세 레코드.
///
/// 가격 필드는 원본에 없거나 파싱할 수 없으면 `None`이며, 0으로 대체하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRow {
    /// 대문자 티커
    pub symbol: String,
    /// 거래일 (시간 정보 없음)
    pub trading_day: NaiveDate,
    /// 시가
    pub open: Option<Decimal>,
    /// 고가
    pub high: Option<Decimal>,
    /// 저가
    pub low: Option<Decimal>,
    /// 종가
    pub close: Option<Decimal>,
    /// 수정 종가
    pub adjusted_close: Option<Decimal>,
    /// 거래량 (원본에 없으면 0)
    pub volume: i64,
}

impl PriceRow {
    /// 가격 필드가 비어 있는 새 레코드를 생성합니다.
    pub fn new(symbol: &str, trading_day: NaiveDate) -> CoreResult<Self> {
        Ok(Self {
            symbol: normalize_symbol(symbol)?,
            trading_day,
            open: None,
            high: None,
            low: None,
            close: None,
            adjusted_close: None,
            volume: 0,
        })
    }

    /// 시가/고가/저가/종가를 설정합니다.
    pub fn with_prices(
        mut self,
        open: Option<Decimal>,
        high: Option<Decimal>,
        low: Option<Decimal>,
        close: Option<Decimal>,
    ) -> Self {
        self.open = open;
        self.high = high;
        self.low = low;
        self.close = close;
        self
    }

    /// 수정 종가를 설정합니다. `None`이면 종가를 사용합니다.
    pub fn with_adjusted_close(mut self, adjusted_close: Option<Decimal>) -> Self {
        self.adjusted_close = adjusted_close.or(self.close);
        self
    }

    /// 거래량을 설정합니다. 음수는 거부합니다.
    pub fn with_volume(mut self, volume: i64) -> CoreResult<Self> {
        if volume < 0 {
            return Err(CoreError::InvalidVolume(volume));
        }
        self.volume = volume;
        Ok(self)
    }

    /// 자연키 `(symbol, trading_day)`.
    pub fn key(&self) -> (&str, NaiveDate) {
        (self.symbol.as_str(), self.trading_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_new_normalizes_symbol() {
        let row = PriceRow::new(" aapl", day("2024-01-02")).unwrap();
        assert_eq!(row.symbol, "AAPL");
        assert_eq!(row.volume, 0);
        assert!(row.open.is_none());
        assert!(row.adjusted_close.is_none());

        assert_eq!(
            PriceRow::new("", day("2024-01-02")),
            Err(CoreError::InvalidSymbol(String::new()))
        );
    }

    #[test]
    fn test_adjusted_close_falls_back_to_close() {
        let row = PriceRow::new("MSFT", day("2024-01-02"))
            .unwrap()
            .with_prices(Some(dec!(370.1)), None, None, Some(dec!(372.5)))
            .with_adjusted_close(None);
        assert_eq!(row.adjusted_close, Some(dec!(372.5)));

        let row = row.with_adjusted_close(Some(dec!(371.9)));
        assert_eq!(row.adjusted_close, Some(dec!(371.9)));
    }

    #[test]
    fn test_negative_volume_rejected() {
        let row = PriceRow::new("MSFT", day("2024-01-02")).unwrap();
        assert_eq!(
            row.clone().with_volume(-1),
            Err(CoreError::InvalidVolume(-1))
        );
        assert_eq!(row.with_volume(1200).unwrap().volume, 1200);
    }

    #[test]
    fn test_key() {
        let row = PriceRow::new("ibm", day("2024-03-01")).unwrap();
        assert_eq!(row.key(), ("IBM", day("2024-03-01")));
    }
}
