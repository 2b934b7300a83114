use crate::config::Settings;
use crate::fetch::error::FetchError;
use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const ENDPOINT: &str = "prediction";
const DEFAULT_PATH: &str = "/v1/prediction";

/// How far ahead the model is asked to predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    NextDay,
    NextWeek,
}

impl Horizon {
    pub fn as_query(self) -> &'static str {
        match self {
            Horizon::NextDay => "next_day",
            Horizon::NextWeek => "next_week",
        }
    }
}

#[async_trait::async_trait]
pub trait PredictionProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_predicted_price(&self, horizon: Horizon, ticker: &str) -> Result<f64>;
}

#[derive(Debug, Deserialize)]
struct PredictedPriceResponse {
    predicted_price: f64,
}

#[derive(Debug, Clone)]
pub struct HttpPredictionProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPredictionProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: crate::fetch::http_client(timeout)?,
            base_url: base_url.to_string(),
            api_key,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.require_prediction_base_url()?,
            settings.prediction_api_key.clone(),
            settings.fetch_timeout(),
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl PredictionProvider for HttpPredictionProvider {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    // No retries: a failed prediction fetch fails the whole refresh and the
    // caller falls back to an empty series.
    async fn fetch_predicted_price(&self, horizon: Horizon, ticker: &str) -> Result<f64> {
        let url = crate::fetch::join_url(&self.base_url, DEFAULT_PATH);
        let headers = self.headers()?;

        let res = self
            .http
            .get(url)
            .headers(headers)
            .query(&[("ticker", ticker), ("horizon", horizon.as_query())])
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                endpoint: ENDPOINT,
                status: None,
                detail: e.to_string(),
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|e| FetchError::Transport {
            endpoint: ENDPOINT,
            status: Some(status.as_u16()),
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(FetchError::Transport {
                endpoint: ENDPOINT,
                status: Some(status.as_u16()),
                detail: text,
            }
            .into());
        }

        let parsed: PredictedPriceResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedPayload {
                endpoint: ENDPOINT,
                detail: format!("{e}: {text}"),
            })?;

        if !parsed.predicted_price.is_finite() {
            return Err(FetchError::MalformedPayload {
                endpoint: ENDPOINT,
                detail: format!("predicted_price is not finite: {}", parsed.predicted_price),
            }
            .into());
        }

        Ok(parsed.predicted_price)
    }
}
