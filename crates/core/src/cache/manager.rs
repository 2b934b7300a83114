use crate::cache::store::KeyValueStore;
use crate::domain::prediction::{CachedPrediction, PriceSeries};
use crate::fetch::prediction::{Horizon, PredictionProvider};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

const CACHE_KEY_PREFIX: &str = "prediction:";
const MAX_AGE_HOURS: i64 = 24;

/// Canonical cache key: fixed prefix plus upper-cased ticker, one entry per
/// symbol. The legacy page mixed this with a single shared key; the stored
/// ticker is still cross-checked on every read.
pub fn cache_key(ticker: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{}", ticker.trim().to_uppercase())
}

/// Decides per ticker whether a stored prediction is still servable or a
/// fresh pair of fetches is needed, and writes fresh results back stamped
/// with the fetch time.
pub struct PredictionCache {
    provider: Arc<dyn PredictionProvider>,
    store: Arc<dyn KeyValueStore>,
}

impl PredictionCache {
    pub fn new(provider: Arc<dyn PredictionProvider>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { provider, store }
    }

    /// Error boundary for the page: a failed lookup or refresh is logged and
    /// rendered as an empty series, never raised.
    pub async fn get_prediction(&self, ticker: &str, now: DateTime<Utc>) -> PriceSeries {
        match self.get_or_refresh(ticker, now).await {
            Ok(series) => series,
            Err(err) => {
                tracing::warn!(ticker, error = %err, "prediction unavailable; returning empty series");
                PriceSeries::empty()
            }
        }
    }

    pub async fn get_or_refresh(&self, ticker: &str, now: DateTime<Utc>) -> Result<PriceSeries> {
        let ticker = ticker.trim().to_uppercase();
        anyhow::ensure!(!ticker.is_empty(), "ticker must be non-empty");

        let key = cache_key(&ticker);
        if let Some(data) = self.lookup_fresh(&key, &ticker, now)? {
            tracing::debug!(%ticker, "prediction cache hit");
            return Ok(data);
        }

        self.refresh(&key, &ticker, now).await
    }

    /// Returns the cached series only while the entry is younger than the
    /// cache horizon and stored for this exact ticker. Anything else is
    /// deleted from the store before the caller falls through to a fetch.
    fn lookup_fresh(
        &self,
        key: &str,
        ticker: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PriceSeries>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };

        let entry = match serde_json::from_str::<CachedPrediction>(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding undecodable cache entry");
                self.store.delete(key)?;
                return Ok(None);
            }
        };

        if entry.ticker != ticker {
            // A colliding key must never serve another ticker's prediction.
            tracing::warn!(key, stored = %entry.ticker, requested = %ticker, "discarding cache entry for mismatched ticker");
            self.store.delete(key)?;
            return Ok(None);
        }

        if now - entry.timestamp >= Duration::hours(MAX_AGE_HOURS) {
            tracing::debug!(%ticker, cached_at = %entry.timestamp, "prediction cache entry expired");
            self.store.delete(key)?;
            return Ok(None);
        }

        Ok(Some(entry.data))
    }

    async fn refresh(&self, key: &str, ticker: &str, now: DateTime<Utc>) -> Result<PriceSeries> {
        // Both horizons are fetched concurrently and both must succeed;
        // partial results are never served and failures are never cached.
        let (day_price, week_price) = tokio::try_join!(
            self.provider.fetch_predicted_price(Horizon::NextDay, ticker),
            self.provider.fetch_predicted_price(Horizon::NextWeek, ticker),
        )?;

        let (day, week) = crate::time::market::prediction_dates(now.date_naive());
        let data = PriceSeries {
            dates: vec![day, week],
            prices: vec![day_price, week_price],
        };

        let record = CachedPrediction {
            ticker: ticker.to_string(),
            timestamp: now,
            data: data.clone(),
        };
        let raw = serde_json::to_string(&record).context("failed to serialize cache record")?;
        self.store.set(key, &raw)?;

        tracing::debug!(%ticker, day = %day, week = %week, "prediction cache refreshed");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        calls: AtomicUsize,
        day_price: f64,
        week_price: f64,
        fail: bool,
    }

    impl StubProvider {
        fn new(day_price: f64, week_price: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                day_price,
                week_price,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(0.0, 0.0)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PredictionProvider for StubProvider {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_predicted_price(&self, horizon: Horizon, _ticker: &str) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("stub provider down");
            }
            Ok(match horizon {
                Horizon::NextDay => self.day_price,
                Horizon::NextWeek => self.week_price,
            })
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn cache_with(
        provider: StubProvider,
    ) -> (PredictionCache, Arc<StubProvider>, Arc<MemoryStore>) {
        let provider = Arc::new(provider);
        let store = Arc::new(MemoryStore::new());
        let cache = PredictionCache::new(provider.clone(), store.clone());
        (cache, provider, store)
    }

    #[tokio::test]
    async fn second_call_within_24h_hits_cache() {
        let (cache, provider, _store) = cache_with(StubProvider::new(231.5, 238.2));
        // 2026-08-25 is Tuesday.
        let now = utc(2026, 8, 25, 12);

        let first = cache.get_prediction("AAPL", now).await;
        assert_eq!(provider.calls(), 2);
        assert_eq!(first.prices, vec![231.5, 238.2]);
        assert_eq!(
            first.dates,
            vec![
                chrono::NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            ]
        );

        let second = cache
            .get_prediction("AAPL", now + Duration::hours(23))
            .await;
        assert_eq!(second, first);
        // Still one fetch pair.
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn expired_entry_is_deleted_before_refetch() {
        let (cache, provider, store) = cache_with(StubProvider::new(100.0, 101.0));
        let written_at = utc(2026, 8, 24, 9);

        cache.get_prediction("AAPL", written_at).await;
        assert_eq!(provider.calls(), 2);
        let key = cache_key("AAPL");
        let first_raw = store.get(&key).unwrap().unwrap();

        let later = written_at + Duration::hours(24);
        cache.get_prediction("AAPL", later).await;
        assert_eq!(provider.calls(), 4);

        // The store holds a freshly stamped record, not the expired one.
        let second_raw = store.get(&key).unwrap().unwrap();
        let record: CachedPrediction = serde_json::from_str(&second_raw).unwrap();
        assert_eq!(record.timestamp, later);
        assert_ne!(first_raw, second_raw);
    }

    #[tokio::test]
    async fn expired_entry_is_removed_even_when_refetch_fails() {
        let (cache, _provider, store) = cache_with(StubProvider::failing());
        let key = cache_key("AAPL");
        let stale = CachedPrediction {
            ticker: "AAPL".to_string(),
            timestamp: utc(2026, 8, 23, 9),
            data: PriceSeries {
                dates: vec![chrono::NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()],
                prices: vec![99.0],
            },
        };
        store
            .set(&key, &serde_json::to_string(&stale).unwrap())
            .unwrap();

        let series = cache.get_prediction("AAPL", utc(2026, 8, 25, 9)).await;
        assert!(series.is_empty());
        // Stale entry was evicted before the fetch was attempted, and the
        // failure was not cached in its place.
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[tokio::test]
    async fn mismatched_ticker_is_never_served() {
        let (cache, provider, store) = cache_with(StubProvider::new(250.0, 260.0));
        // Simulate a legacy shared-key collision: MSFT's slot holds AAPL data.
        let key = cache_key("MSFT");
        let foreign = CachedPrediction {
            ticker: "AAPL".to_string(),
            timestamp: utc(2026, 8, 25, 9),
            data: PriceSeries {
                dates: vec![chrono::NaiveDate::from_ymd_opt(2026, 8, 26).unwrap()],
                prices: vec![231.5],
            },
        };
        store
            .set(&key, &serde_json::to_string(&foreign).unwrap())
            .unwrap();

        let series = cache.get_prediction("MSFT", utc(2026, 8, 25, 10)).await;
        assert_eq!(provider.calls(), 2);
        assert_eq!(series.prices, vec![250.0, 260.0]);

        let record: CachedPrediction =
            serde_json::from_str(&store.get(&key).unwrap().unwrap()).unwrap();
        assert_eq!(record.ticker, "MSFT");
    }

    #[tokio::test]
    async fn undecodable_entry_is_discarded_and_refetched() {
        let (cache, provider, store) = cache_with(StubProvider::new(10.0, 11.0));
        let key = cache_key("AAPL");
        store.set(&key, "not json").unwrap();

        let series = cache.get_prediction("AAPL", utc(2026, 8, 25, 9)).await;
        assert_eq!(provider.calls(), 2);
        assert_eq!(series.prices, vec![10.0, 11.0]);
        assert!(serde_json::from_str::<CachedPrediction>(&store.get(&key).unwrap().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn fetch_failure_yields_empty_and_caches_nothing() {
        let store = Arc::new(MemoryStore::new());
        let failing = PredictionCache::new(Arc::new(StubProvider::failing()), store.clone());
        let now = utc(2026, 8, 25, 9);

        let series = failing.get_prediction("AAPL", now).await;
        assert!(series.is_empty());
        assert_eq!(store.get(&cache_key("AAPL")).unwrap(), None);

        // A later call against a recovered provider fetches fresh data.
        let recovered = PredictionCache::new(Arc::new(StubProvider::new(5.0, 6.0)), store.clone());
        let series = recovered.get_prediction("AAPL", now).await;
        assert_eq!(series.prices, vec![5.0, 6.0]);
    }

    #[tokio::test]
    async fn ticker_is_canonicalized_before_keying() {
        let (cache, provider, store) = cache_with(StubProvider::new(1.0, 2.0));
        let now = utc(2026, 8, 25, 9);

        cache.get_prediction(" aapl ", now).await;
        assert_eq!(provider.calls(), 2);
        assert!(store.get(&cache_key("AAPL")).unwrap().is_some());

        // Same symbol in another spelling is the same cache slot.
        cache.get_prediction("AAPL", now).await;
        assert_eq!(provider.calls(), 2);
    }
}
