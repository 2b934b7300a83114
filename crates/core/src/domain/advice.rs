use serde::{Deserialize, Serialize};

/// Buy/sell guidance from the recommendation service. Both fields are `None`
/// when the upstream call failed; display layers show a fallback message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub recommendation: Option<String>,
    pub confidence_score: Option<f64>,
}

impl Advice {
    pub fn neutral() -> Self {
        Self {
            recommendation: None,
            confidence_score: None,
        }
    }
}
