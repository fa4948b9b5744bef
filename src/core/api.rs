use crate::config::ApiConfig;
use crate::models::StockComparison;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

static SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9.\-]{0,9}$").expect("symbol regex is valid"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("unable to connect to {0}")]
    Connect(String),

    #[error("server responded with status: {0}")]
    Status(u16),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    fn from_reqwest(err: reqwest::Error, timeout: Option<Duration>) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout.unwrap_or_default())
        } else if err.is_connect() {
            let target = err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "server".to_string());
            ApiError::Connect(target)
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatQuery<'a> {
    user_id: &'a str,
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

/// Client for the research backend's non-history endpoints
#[derive(Clone)]
pub struct ResearchClient {
    client: Client,
    base_url: Url,
    chat_timeout: Duration,
    health_timeout: Duration,
}

impl ResearchClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidInput(format!("base url '{}': {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidInput(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            chat_timeout: config.chat_timeout(),
            health_timeout: config.health_timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        request: RequestBuilder,
        timeout: Option<Duration>,
    ) -> Result<Response, ApiError> {
        let request = match timeout {
            Some(t) => request.timeout(t),
            None => request,
        };

        let response = request
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("[ResearchClient] {} returned status {}", response.url(), status);
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Ask the assistant. Bound by the chat timeout (30s by default).
    pub async fn send_chat_message(&self, user_id: &str, query: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["api", "chat", ""]);
        let timeout = Some(self.chat_timeout);

        tracing::info!("[ResearchClient] Sending query for user '{}'", user_id);
        let response = self
            .send(
                self.client.post(url).json(&ChatQuery { user_id, query }),
                timeout,
            )
            .await?;

        let reply: ChatReply = Self::decode(response, timeout).await?;
        Ok(reply.response)
    }

    /// `GET /` bound by the health timeout (5s by default). Any non-2xx is a failure.
    pub async fn check_health(&self) -> Result<(), ApiError> {
        self.send(self.client.get(self.base_url.clone()), Some(self.health_timeout))
            .await?;
        Ok(())
    }

    pub async fn fetch_stock_price(&self, symbol: &str) -> Result<Value, ApiError> {
        let symbols = normalize_symbols(symbol)?;
        let [symbol] = symbols.as_slice() else {
            return Err(ApiError::InvalidInput(
                "exactly one symbol is required".to_string(),
            ));
        };

        let url = self.endpoint(&["api", "stock", symbol.as_str()]);
        let response = self.send(self.client.get(url), None).await?;
        Self::decode(response, None).await
    }

    /// `symbols` is user input such as `"aapl, msft"`
    pub async fn compare_stocks(&self, symbols: &str) -> Result<StockComparison, ApiError> {
        let symbols = normalize_symbols(symbols)?;

        let mut url = self.endpoint(&["api", "compare-stocks", ""]);
        url.query_pairs_mut().append_pair("symbols", &symbols.join(","));

        let response = self.send(self.client.get(url), None).await?;
        Self::decode(response, None).await
    }
}

/// Split comma-separated input into upper-cased ticker symbols
pub fn normalize_symbols(input: &str) -> Result<Vec<String>, ApiError> {
    let symbols: Vec<String> = input
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(ApiError::InvalidInput("no stock symbols given".to_string()));
    }

    if let Some(bad) = symbols.iter().find(|s| !SYMBOL_RE.is_match(s)) {
        return Err(ApiError::InvalidInput(format!("'{}' is not a stock symbol", bad)));
    }

    Ok(symbols)
}
