use crate::config::Settings;
use crate::domain::advice::Advice;
use crate::fetch::error::FetchError;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

const ENDPOINT: &str = "recommendation";
const DEFAULT_PATH: &str = "/v1/recommendation";

#[async_trait::async_trait]
pub trait RecommendationProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_recommendation(&self, ticker: &str) -> Result<Advice>;
}

#[derive(Debug, Deserialize)]
struct RecommendationResponse {
    recommendation: String,
    confidence_score: f64,
}

impl RecommendationResponse {
    fn into_advice(self) -> Result<Advice, FetchError> {
        let recommendation = self.recommendation.trim().to_string();
        if recommendation.is_empty() {
            return Err(FetchError::MalformedPayload {
                endpoint: ENDPOINT,
                detail: "recommendation must be non-empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(FetchError::MalformedPayload {
                endpoint: ENDPOINT,
                detail: format!(
                    "confidence_score must be between 0 and 1 (got {})",
                    self.confidence_score
                ),
            });
        }
        Ok(Advice {
            recommendation: Some(recommendation),
            confidence_score: Some(self.confidence_score),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpRecommendationProvider {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRecommendationProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: crate::fetch::http_client(timeout)?,
            base_url: base_url.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.require_recommendation_base_url()?,
            settings.fetch_timeout(),
        )
    }
}

#[async_trait::async_trait]
impl RecommendationProvider for HttpRecommendationProvider {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_recommendation(&self, ticker: &str) -> Result<Advice> {
        let url = crate::fetch::join_url(&self.base_url, DEFAULT_PATH);

        let res = self
            .http
            .get(url)
            .query(&[("ticker", ticker)])
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

        let parsed: RecommendationResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedPayload {
                endpoint: ENDPOINT,
                detail: format!("{e}: {text}"),
            })?;

        Ok(parsed.into_advice()?)
    }
}

/// Error boundary: recommendation failures degrade to a neutral advice card,
/// never to a page error.
pub async fn recommendation_or_neutral(
    provider: &dyn RecommendationProvider,
    ticker: &str,
) -> Advice {
    match provider.fetch_recommendation(ticker).await {
        Ok(advice) => advice,
        Err(err) => {
            tracing::warn!(ticker, provider = provider.provider_name(), error = %err, "recommendation fetch failed; returning neutral advice");
            Advice::neutral()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_expected_shape() {
        let v = json!({ "recommendation": "buy", "confidence_score": 0.72 });
        let parsed: RecommendationResponse = serde_json::from_value(v).unwrap();
        let advice = parsed.into_advice().unwrap();
        assert_eq!(advice.recommendation.as_deref(), Some("buy"));
        assert_eq!(advice.confidence_score, Some(0.72));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let v = json!({ "recommendation": "buy", "confidence_score": 1.5 });
        let parsed: RecommendationResponse = serde_json::from_value(v).unwrap();
        assert!(parsed.into_advice().is_err());
    }

    struct FailingRecommendation;

    #[async_trait::async_trait]
    impl RecommendationProvider for FailingRecommendation {
        fn provider_name(&self) -> &'static str {
            "failing_stub"
        }

        async fn fetch_recommendation(&self, _ticker: &str) -> Result<Advice> {
            Err(FetchError::Transport {
                endpoint: ENDPOINT,
                status: Some(500),
                detail: "internal error".to_string(),
            }
            .into())
        }
    }

    #[tokio::test]
    async fn failure_degrades_to_neutral() {
        let advice = recommendation_or_neutral(&FailingRecommendation, "AAPL").await;
        assert_eq!(advice, Advice::neutral());
    }
}
