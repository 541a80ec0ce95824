//! Alpha Vantage 시계열 API 클라이언트.
//!
//! `GET {base_url}?function=..&symbol=..&apikey=..&outputsize=..` 요청 한 번으로
//! 한 심볼의 시계열 전체를 가져옵니다.
//!
//! Alpha Vantage는 논리 오류와 호출 한도 초과도 HTTP 200으로 응답하므로
//! 본문의 sentinel 키로 구분합니다:
//! - `"Error Message"`: 잘못된 호출 (존재하지 않는 심볼 등)
//! - `"Note"`, `"Information"`: 호출 한도 안내
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use pricefeed_data::provider::{AlphaVantageClient, ProviderConfig};
//!
//! let client = AlphaVantageClient::new(ProviderConfig::new("demo"))?;
//! let payload = client.fetch_series("IBM").await?;
//! ```

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::debug;

use super::PriceSource;
use crate::error::FetchError;

/// 기본 API 엔드포인트.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// 기본 시계열 function.
pub const DEFAULT_FUNCTION: &str = "TIME_SERIES_DAILY_ADJUSTED";

/// 요청당 타임아웃.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "alpha_vantage";

const ERROR_SENTINEL: &str = "Error Message";
const RATE_LIMIT_SENTINELS: &[&str] = &["Note", "Information"];

/// 에러 응답 본문 로그 최대 길이.
const MAX_ERROR_BODY: usize = 200;

/// 응답 크기 옵션.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputSize {
    /// 최근 100개 데이터 포인트
    #[default]
    Compact,
    /// 전체 이력
    Full,
}

impl OutputSize {
    /// 쿼리 파라미터 값.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

impl FromStr for OutputSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(OutputSize::Compact),
            "full" => Ok(OutputSize::Full),
            other => Err(format!("Unknown output size: {}", other)),
        }
    }
}

/// 클라이언트 설정.
#[derive(Debug)]
pub struct ProviderConfig {
    /// API 엔드포인트
    pub base_url: String,
    /// API 키 (없으면 클라이언트 생성 시 설정 에러)
    pub api_key: Option<SecretString>,
    /// 시계열 function (예: TIME_SERIES_DAILY, TIME_SERIES_DAILY_ADJUSTED)
    pub function: String,
    /// 응답 크기
    pub output_size: OutputSize,
    /// 요청당 타임아웃
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            function: DEFAULT_FUNCTION.to_string(),
            output_size: OutputSize::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ProviderConfig {
    /// API 키만 지정한 기본 설정.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::from(api_key.into())),
            ..Default::default()
        }
    }

    /// 엔드포인트를 변경합니다.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 시계열 function을 변경합니다.
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }
}

/// Alpha Vantage 클라이언트.
///
/// 내부 `reqwest::Client`는 호출별 가변 상태가 없으므로 동시 조회에서 공유해도 됩니다.
pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    function: String,
    output_size: OutputSize,
}

impl AlphaVantageClient {
    /// 새 클라이언트를 생성합니다.
    ///
    /// API 키가 없거나 비어 있으면 조회 전에 `FetchError::Config`를 반환합니다.
    pub fn new(config: ProviderConfig) -> Result<Self, FetchError> {
        let api_key = config
            .api_key
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| FetchError::Config("ALPHAVANTAGE_API_KEY is not set".to_string()))?;

        if config.function.trim().is_empty() {
            return Err(FetchError::Config(
                "ALPHAVANTAGE_FUNCTION is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            api_key,
            function: config.function,
            output_size: config.output_size,
        })
    }

    /// 요청 function.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// 한 심볼의 시계열 응답을 조회합니다.
    pub async fn fetch_series(&self, symbol: &str) -> Result<Value, FetchError> {
        debug!(
            symbol = symbol,
            function = %self.function,
            outputsize = self.output_size.as_str(),
            url = %self.base_url,
            "Alpha Vantage 요청"
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", self.function.as_str()),
                ("symbol", symbol),
                ("apikey", self.api_key.expose_secret()),
                ("outputsize", self.output_size.as_str()),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            FetchError::Decode(format!("{} ({})", e, truncate(&body, MAX_ERROR_BODY)))
        })?;

        if let Some(object) = payload.as_object() {
            check_error_envelope(symbol, object)?;
        }

        Ok(payload)
    }
}

#[async_trait]
impl PriceSource for AlphaVantageClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch(&self, symbol: &str) -> Result<Value, FetchError> {
        self.fetch_series(symbol).await
    }
}

/// 200 응답 본문에 포함된 오류 envelope을 확인합니다.
pub fn check_error_envelope(symbol: &str, body: &Map<String, Value>) -> Result<(), FetchError> {
    if let Some(message) = body.get(ERROR_SENTINEL) {
        return Err(FetchError::Provider(format!(
            "{}: {}",
            symbol,
            sentinel_text(message)
        )));
    }

    for key in RATE_LIMIT_SENTINELS {
        if let Some(message) = body.get(*key) {
            return Err(FetchError::RateLimited(format!(
                "{}: {}",
                symbol,
                sentinel_text(message)
            )));
        }
    }

    Ok(())
}

fn sentinel_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
