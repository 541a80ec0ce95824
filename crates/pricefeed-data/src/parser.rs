//! 시계열 응답 파서.
//!
//! Alpha Vantage 응답은 요청한 function에 따라 시계열 키 이름과 필드 이름이
//! 달라집니다. 예를 들어 `TIME_SERIES_DAILY`는 `"Time Series (Daily)"` 아래
//! `"5. volume"`을, `TIME_SERIES_DAILY_ADJUSTED`는 `"5. adjusted close"`와
//! `"6. volume"`을 사용합니다.
//!
//! # 처리 규칙
//!
//! - 시계열 키는 `"Time Series"`를 포함하는 첫 번째 키입니다. 없으면 빈 결과입니다.
//! - 각 필드는 별칭 목록 중 처음으로 값이 있는 항목을 사용합니다.
//! - 날짜나 숫자가 잘못된 항목은 건너뛰고 나머지를 계속 처리합니다.
//! - 응답 자체가 객체가 아닌 경우에만 에러를 반환합니다.

use std::str::FromStr;

use chrono::NaiveDate;
use pricefeed_core::{normalize_symbol, CoreError, PriceRow};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{DataError, Result};

/// 시계열 키 식별 패턴.
pub const SERIES_KEY_PATTERN: &str = "Time Series";

/// 거래일 키 형식.
const DATE_FORMAT: &str = "%Y-%m-%d";

const OPEN_ALIASES: &[&str] = &["1. open", "1a. open (USD)"];
const HIGH_ALIASES: &[&str] = &["2. high", "2a. high (USD)"];
const LOW_ALIASES: &[&str] = &["3. low", "3a. low (USD)"];
const CLOSE_ALIASES: &[&str] = &["4. close", "4a. close (USD)"];
const ADJUSTED_CLOSE_ALIASES: &[&str] = &["5. adjusted close"];
const VOLUME_ALIASES: &[&str] = &["6. volume", "5. volume", "5. volume (USD)"];

/// 개별 항목 파싱 실패 사유.
#[derive(Debug, Error)]
enum EntryError {
    #[error("invalid date key {0:?}")]
    InvalidDate(String),

    #[error("entry is not an object")]
    NotAnObject,

    #[error("field {field} is not numeric: {value}")]
    NotNumeric { field: &'static str, value: String },

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// 응답에서 시계열 키를 찾습니다.
pub fn find_series_key(payload: &Map<String, Value>) -> Option<&str> {
    payload
        .keys()
        .find(|key| key.contains(SERIES_KEY_PATTERN))
        .map(String::as_str)
}

/// 시계열 응답을 일별 시세 레코드로 변환합니다.
///
/// 반환 순서는 의미가 없습니다. 잘못된 항목은 결과에서 빠질 뿐 에러가 되지
/// 않으며, 시계열 키가 없으면 빈 벡터를 반환합니다.
pub fn parse_daily_series(symbol: &str, payload: &Value) -> Result<Vec<PriceRow>> {
    let symbol = normalize_symbol(symbol)?;

    let object = payload
        .as_object()
        .ok_or_else(|| DataError::ParseError(format!("{}: payload is not a JSON object", symbol)))?;

    let Some(series_key) = find_series_key(object) else {
        debug!(symbol = %symbol, "시계열 키 없음");
        return Ok(Vec::new());
    };

    let series = object[series_key].as_object().ok_or_else(|| {
        DataError::ParseError(format!("{}: {:?} is not a JSON object", symbol, series_key))
    })?;

    let mut rows = Vec::with_capacity(series.len());
    let mut skipped = 0usize;

    for (day, entry) in series {
        match parse_entry(&symbol, day, entry) {
            Ok(row) => rows.push(row),
            Err(reason) => {
                skipped += 1;
                debug!(symbol = %symbol, day = %day, reason = %reason, "잘못된 항목 건너뜀");
            }
        }
    }

    if skipped > 0 {
        warn!(
            symbol = %symbol,
            series_key = series_key,
            parsed = rows.len(),
            skipped = skipped,
            "일부 항목 파싱 실패"
        );
    }

    Ok(rows)
}

/// 한 거래일 항목을 변환합니다.
fn parse_entry(symbol: &str, day: &str, entry: &Value) -> std::result::Result<PriceRow, EntryError> {
    let trading_day = NaiveDate::parse_from_str(day.trim(), DATE_FORMAT)
        .map_err(|_| EntryError::InvalidDate(day.to_string()))?;
    let fields = entry.as_object().ok_or(EntryError::NotAnObject)?;

    let open = decimal_field(fields, "open", OPEN_ALIASES)?;
    let high = decimal_field(fields, "high", HIGH_ALIASES)?;
    let low = decimal_field(fields, "low", LOW_ALIASES)?;
    let close = decimal_field(fields, "close", CLOSE_ALIASES)?;
    let adjusted_close = decimal_field(fields, "adjusted_close", ADJUSTED_CLOSE_ALIASES)?;
    let volume = volume_field(fields)?;

    let row = PriceRow::new(symbol, trading_day)?
        .with_prices(open, high, low, close)
        .with_adjusted_close(adjusted_close)
        .with_volume(volume)?;

    Ok(row)
}

/// 별칭 목록에서 처음으로 값이 있는 필드를 찾습니다.
///
/// `null`과 빈 문자열은 값이 없는 것으로 취급합니다.
fn lookup<'a>(fields: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .find(|value| !is_blank(value))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn decimal_field(
    fields: &Map<String, Value>,
    field: &'static str,
    aliases: &[&str],
) -> std::result::Result<Option<Decimal>, EntryError> {
    match lookup(fields, aliases) {
        None => Ok(None),
        Some(value) => to_decimal(value)
            .map(Some)
            .ok_or_else(|| EntryError::NotNumeric {
                field,
                value: value.to_string(),
            }),
    }
}

/// 거래량 필드. 없으면 0, 정수가 아니면 실패입니다.
fn volume_field(fields: &Map<String, Value>) -> std::result::Result<i64, EntryError> {
    let Some(value) = lookup(fields, VOLUME_ALIASES) else {
        return Ok(0);
    };

    to_decimal(value)
        .filter(|d| d.fract().is_zero())
        .and_then(|d| d.to_i64())
        .ok_or_else(|| EntryError::NotNumeric {
            field: "volume",
            value: value.to_string(),
        })
}

/// 문자열 또는 JSON 숫자를 Decimal로 변환합니다.
fn to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_daily_payload_single_entry() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": {
                    "1. open": "185.0",
                    "4. close": "185.6",
                    "6. volume": "1000"
                }
            }
        });

        let rows = parse_daily_series("AAPL", &payload).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.symbol, "AAPL");
        assert_eq!(row.trading_day, day("2024-01-02"));
        assert_eq!(row.open, Some(dec!(185.0)));
        assert_eq!(row.high, None);
        assert_eq!(row.low, None);
        assert_eq!(row.close, Some(dec!(185.6)));
        assert_eq!(row.adjusted_close, Some(dec!(185.6)));
        assert_eq!(row.volume, 1000);
    }

    #[test]
    fn test_adjusted_payload_uses_adjusted_close_and_volume_alias() {
        let payload = json!({
            "Meta Data": {
                "1. Information": "Daily Time Series with Splits and Dividend Events",
                "2. Symbol": "MSFT"
            },
            "Time Series (Daily)": {
                "2024-03-01": {
                    "1. open": "411.27",
                    "2. high": "415.87",
                    "3. low": "410.88",
                    "4. close": "415.5",
                    "5. adjusted close": "414.12",
                    "6. volume": "17823447",
                    "7. dividend amount": "0.0000",
                    "8. split coefficient": "1.0"
                }
            }
        });

        let rows = parse_daily_series("msft", &payload).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.symbol, "MSFT");
        assert_eq!(row.high, Some(dec!(415.87)));
        assert_eq!(row.low, Some(dec!(410.88)));
        assert_eq!(row.adjusted_close, Some(dec!(414.12)));
        assert_eq!(row.volume, 17823447);
    }

    #[test]
    fn test_plain_daily_volume_alias() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-03-01": { "4. close": "415.5", "5. volume": "1200" }
            }
        });

        let rows = parse_daily_series("MSFT", &payload).unwrap();
        assert_eq!(rows[0].volume, 1200);
        assert_eq!(rows[0].adjusted_close, Some(dec!(415.5)));
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": { "1. open": "185.0", "4. close": "185.6" },
                "2024-01-03": { "1. open": "n/a", "4. close": "184.2" }
            }
        });

        let rows = parse_daily_series("AAPL", &payload).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trading_day, day("2024-01-02"));
    }

    #[test]
    fn test_bad_date_and_non_object_entries_are_skipped() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-13-45": { "4. close": "1.0" },
                "yesterday": { "4. close": "1.0" },
                "2024-01-04": "185.0",
                "2024-01-05": { "4. close": "1.5", "6. volume": "-3" },
                "2024-01-08": { "4. close": "2.0", "6. volume": "12.5" },
                "2024-01-09": { "4. close": "2.5" }
            }
        });

        let rows = parse_daily_series("AAPL", &payload).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trading_day, day("2024-01-09"));
        assert_eq!(rows[0].volume, 0);
    }

    #[test]
    fn test_missing_and_blank_fields_are_null_not_zero() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": { "1. open": "", "2. high": null, "4. close": "10" }
            }
        });

        let rows = parse_daily_series("AAPL", &payload).unwrap();
        assert_eq!(rows[0].open, None);
        assert_eq!(rows[0].high, None);
        assert_eq!(rows[0].low, None);
        assert_eq!(rows[0].close, Some(dec!(10)));
    }

    #[test]
    fn test_numeric_json_values() {
        let payload = json!({
            "Weekly Time Series": {
                "2024-01-05": { "1. open": 185.25, "4. close": 181.18, "5. volume": 1000000 }
            }
        });

        let rows = parse_daily_series("AAPL", &payload).unwrap();
        assert_eq!(rows[0].open, Some(dec!(185.25)));
        assert_eq!(rows[0].close, Some(dec!(181.18)));
        assert_eq!(rows[0].volume, 1_000_000);
    }

    #[test]
    fn test_crypto_aliases() {
        let payload = json!({
            "Time Series (Digital Currency Daily)": {
                "2024-01-02": {
                    "1a. open (USD)": "42283.58",
                    "2a. high (USD)": "45879.63",
                    "3a. low (USD)": "42175.00",
                    "4a. close (USD)": "44954.95"
                }
            }
        });

        let rows = parse_daily_series("btc", &payload).unwrap();
        assert_eq!(rows[0].symbol, "BTC");
        assert_eq!(rows[0].open, Some(dec!(42283.58)));
        assert_eq!(rows[0].close, Some(dec!(44954.95)));
    }

    #[test]
    fn test_no_series_key_yields_empty() {
        let payload = json!({ "Meta Data": { "2. Symbol": "AAPL" } });
        assert!(parse_daily_series("AAPL", &payload).unwrap().is_empty());

        assert!(parse_daily_series("AAPL", &json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_systemic_errors() {
        assert!(matches!(
            parse_daily_series("AAPL", &json!(["not", "a", "map"])),
            Err(DataError::ParseError(_))
        ));
        assert!(matches!(
            parse_daily_series("AAPL", &json!({ "Time Series (Daily)": [] })),
            Err(DataError::ParseError(_))
        ));
        assert!(matches!(
            parse_daily_series("  ", &json!({})),
            Err(DataError::InvalidData(_))
        ));
    }

    #[test]
    fn test_find_series_key() {
        let payload = json!({
            "Meta Data": {},
            "Time Series (60min)": {}
        });
        let object = payload.as_object().unwrap();
        assert_eq!(find_series_key(object), Some("Time Series (60min)"));

        let payload = json!({ "Note": "rate limited" });
        assert_eq!(find_series_key(payload.as_object().unwrap()), None);
    }
}
