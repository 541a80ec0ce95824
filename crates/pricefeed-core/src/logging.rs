//! 수집 파이프라인 로깅 초기화.
//!
//! 기본 필터는 파이프라인 crate들(`pricefeed_*`)에만 레벨을 적용하고,
//! `RUST_LOG`가 있으면 그 값을 그대로 사용합니다. `LOG_FORMAT=json`이면
//! 이벤트에 현재 심볼 span 필드가 함께 기록되어 로그 집계에서 심볼별로
//! 묶을 수 있습니다.

use tracing_subscriber::{
    fmt, layer::Layered, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

/// 기본 필터를 적용할 파이프라인 crate.
pub const PIPELINE_TARGETS: &[&str] = &["pricefeed_collector", "pricefeed_data", "pricefeed_core"];

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 여러 줄, 개발용
    #[default]
    Pretty,
    /// 한 줄 JSON, 운영용
    Json,
    /// 한 줄 텍스트
    Compact,
}

impl LogFormat {
    /// `LOG_FORMAT` 값을 해석합니다. 알 수 없는 값이면 `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// 로깅 초기화 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` 지시어
    pub filter: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// 파이프라인 crate에 `level`을 적용하는 설정.
    pub fn for_level(level: &str) -> Self {
        Self {
            filter: pipeline_filter(level),
            format: LogFormat::default(),
        }
    }

    /// 환경 변수(`RUST_LOG`, `LOG_FORMAT`)로 설정을 만듭니다.
    pub fn from_env(level: &str) -> Self {
        Self::from_lookup(level, |key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정을 만듭니다.
    pub fn from_lookup<F>(level: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let filter = lookup("RUST_LOG")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| pipeline_filter(level));
        let format = lookup("LOG_FORMAT")
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Self { filter, format }
    }
}

/// `pricefeed_collector=info,pricefeed_data=info,...` 형태의 필터 지시어.
pub fn pipeline_filter(level: &str) -> String {
    PIPELINE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

type FilteredRegistry = Layered<EnvFilter, Registry>;

fn format_layer(format: LogFormat) -> Box<dyn Layer<FilteredRegistry> + Send + Sync> {
    match format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    }
}

/// 전역 subscriber를 설치합니다. 두 번째 호출은 에러를 반환합니다.
pub fn init_logging(settings: &LogSettings) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_new(&settings.filter)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(format_layer(settings.format))
        .try_init()?;

    tracing::debug!(format = ?settings.format, filter = %settings.filter, "로깅 초기화");
    Ok(())
}

/// 심볼 필드가 붙은 span을 생성합니다.
#[macro_export]
macro_rules! ingest_span {
    ($name:expr, $symbol:expr) => {
        tracing::info_span!($name, symbol = %$symbol)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(level: &str, vars: &[(&str, &str)]) -> LogSettings {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        LogSettings::from_lookup(level, |key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_pipeline_filter_covers_all_crates() {
        assert_eq!(
            pipeline_filter("debug"),
            "pricefeed_collector=debug,pricefeed_data=debug,pricefeed_core=debug"
        );
        assert!(EnvFilter::try_new(pipeline_filter("warn")).is_ok());
    }

    #[test]
    fn test_defaults_without_env() {
        assert_eq!(settings("info", &[]), LogSettings::for_level("info"));
    }

    #[test]
    fn test_env_overrides() {
        let s = settings("info", &[("RUST_LOG", "sqlx=warn,pricefeed_data=trace"), ("LOG_FORMAT", " JSON ")]);
        assert_eq!(s.filter, "sqlx=warn,pricefeed_data=trace");
        assert_eq!(s.format, LogFormat::Json);

        // 알 수 없는 형식과 빈 RUST_LOG는 기본값
        let s = settings("warn", &[("RUST_LOG", " "), ("LOG_FORMAT", "xml")]);
        assert_eq!(s.filter, pipeline_filter("warn"));
        assert_eq!(s.format, LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let s = LogSettings {
            filter: "pricefeed_data=loud".to_string(),
            format: LogFormat::Compact,
        };
        assert!(init_logging(&s).is_err());
    }
}
