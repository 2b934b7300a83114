pub mod cache;
pub mod domain;
pub mod fetch;
pub mod render;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub history_base_url: Option<String>,
        pub history_api_key: Option<String>,
        pub prediction_base_url: Option<String>,
        pub prediction_api_key: Option<String>,
        pub recommendation_base_url: Option<String>,
        pub cache_path: Option<String>,
        pub fetch_timeout_secs: Option<u64>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                history_base_url: std::env::var("HISTORY_API_BASE_URL").ok(),
                history_api_key: std::env::var("HISTORY_API_KEY").ok(),
                prediction_base_url: std::env::var("PREDICTION_API_BASE_URL").ok(),
                prediction_api_key: std::env::var("PREDICTION_API_KEY").ok(),
                recommendation_base_url: std::env::var("RECOMMENDATION_API_BASE_URL").ok(),
                cache_path: std::env::var("CACHE_PATH").ok(),
                fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok()),
            })
        }

        pub fn require_history_base_url(&self) -> anyhow::Result<&str> {
            self.history_base_url
                .as_deref()
                .context("HISTORY_API_BASE_URL is required")
        }

        pub fn require_prediction_base_url(&self) -> anyhow::Result<&str> {
            self.prediction_base_url
                .as_deref()
                .context("PREDICTION_API_BASE_URL is required")
        }

        pub fn require_recommendation_base_url(&self) -> anyhow::Result<&str> {
            self.recommendation_base_url
                .as_deref()
                .context("RECOMMENDATION_API_BASE_URL is required")
        }

        pub fn fetch_timeout(&self) -> Duration {
            Duration::from_secs(self.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS))
        }
    }
}
