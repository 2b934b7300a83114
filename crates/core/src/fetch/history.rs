use crate::config::Settings;
use crate::domain::prediction::PriceSeries;
use crate::fetch::error::FetchError;
use anyhow::Result;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const ENDPOINT: &str = "history";
const DEFAULT_PATH: &str = "/query";

#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily closing prices, oldest first.
    async fn fetch_daily_closes(&self, ticker: &str) -> Result<PriceSeries>;
}

/// Upstream daily time-series payload. Closes arrive as quoted strings keyed
/// under numbered field names; the date map is unordered on the wire.
#[derive(Debug, Deserialize)]
struct DailyHistoryResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: BTreeMap<NaiveDate, DailyBar>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

impl DailyHistoryResponse {
    fn into_series(self) -> Result<PriceSeries, FetchError> {
        let mut dates = Vec::with_capacity(self.time_series.len());
        let mut prices = Vec::with_capacity(self.time_series.len());

        // BTreeMap iteration is already ascending by date.
        for (date, bar) in self.time_series {
            let close: f64 = bar.close.trim().parse().map_err(|_| {
                FetchError::MalformedPayload {
                    endpoint: ENDPOINT,
                    detail: format!("close for {date} is not a number: {:?}", bar.close),
                }
            })?;
            dates.push(date);
            prices.push(close);
        }

        Ok(PriceSeries { dates, prices })
    }
}

#[derive(Debug, Clone)]
pub struct HttpHistoryProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpHistoryProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: crate::fetch::http_client(timeout)?,
            base_url: base_url.to_string(),
            api_key,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.require_history_base_url()?,
            settings.history_api_key.clone(),
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
impl HistoryProvider for HttpHistoryProvider {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage_daily"
    }

    async fn fetch_daily_closes(&self, ticker: &str) -> Result<PriceSeries> {
        let url = crate::fetch::join_url(&self.base_url, DEFAULT_PATH);
        let headers = self.headers()?;

        let res = self
            .http
            .get(url)
            .headers(headers)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", ticker),
                ("outputsize", "compact"),
                ("datatype", "json"),
            ])
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

        let parsed: DailyHistoryResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedPayload {
                endpoint: ENDPOINT,
                detail: format!("{e}: {text}"),
            })?;

        Ok(parsed.into_series()?)
    }
}

/// Error boundary for the chart path: any failure is logged and rendered as
/// "data unavailable" (an empty series), never raised to the page.
pub async fn daily_closes_or_empty(provider: &dyn HistoryProvider, ticker: &str) -> PriceSeries {
    match provider.fetch_daily_closes(ticker).await {
        Ok(series) => series,
        Err(err) => {
            tracing::warn!(ticker, provider = provider.provider_name(), error = %err, "history fetch failed; returning empty series");
            PriceSeries::empty()
        }
    }
}
