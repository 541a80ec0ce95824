//! 심볼 정규화.
//!
//! 수집 대상 티커는 앞뒤 공백을 제거하고 대문자로 통일합니다.
//! 예: `" aapl "` → `"AAPL"`, `"brk.b"` → `"BRK.B"`.

use crate::error::{CoreError, CoreResult};

/// 티커 문자열을 정규화합니다.
///
/// 비어 있거나 내부에 공백이 포함된 티커는 거부합니다.
pub fn normalize_symbol(raw: &str) -> CoreResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidSymbol(raw.to_string()));
    }
    Ok(trimmed.to_uppercase())
}

/// 쉼표로 구분된 심볼 목록을 파싱합니다.
///
/// 빈 항목은 건너뛰고, 중복은 처음 등장한 순서대로 한 번만 남깁니다.
/// 형식이 잘못된 항목이 있으면 에러를 반환합니다.
pub fn parse_symbol_list(raw: &str) -> CoreResult<Vec<String>> {
    let mut symbols: Vec<String> = Vec::new();

    for part in raw.split(',') {
        if part.trim().is_empty() {
            continue;
        }
        let symbol = normalize_symbol(part)?;
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("   ").is_err());
        assert!(normalize_symbol("AA PL").is_err());
    }

    #[test]
    fn test_parse_symbol_list() {
        let symbols = parse_symbol_list("aapl, MSFT,,  ,ibm,AAPL").unwrap();
        assert_eq!(symbols, vec!["AAPL", "MSFT", "IBM"]);

        assert!(parse_symbol_list(" , ,").unwrap().is_empty());
        assert!(parse_symbol_list("AAPL,BAD SYMBOL").is_err());
    }
}
