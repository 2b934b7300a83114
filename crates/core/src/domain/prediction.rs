use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Two parallel sequences of equal length, dates ascending. Used for both
/// historical closes and predicted prices; an empty series means "data
/// unavailable" and consumers render a fallback instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
}

impl PriceSeries {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            prices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }
}

/// The JSON record written to the key-value store, one per ticker.
/// Valid only while younger than the cache horizon and while `ticker`
/// matches the requested symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPrediction {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub data: PriceSeries,
}
