use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One simulated trade the user logged. Constructed only through
/// [`RawLedgerEntry::validate_and_into_entry`]; insertion order is display
/// order and entries are never edited individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub price: f64,
    pub quantity: u32,
}

/// A trade row as submitted, before validation. Field values arrive as raw
/// strings from the input form.
#[derive(Debug, Clone)]
pub struct RawLedgerEntry {
    pub date: String,
    pub price: String,
    pub quantity: String,
}

impl RawLedgerEntry {
    pub fn validate_and_into_entry(self) -> anyhow::Result<LedgerEntry> {
        let date = self.date.trim();
        ensure!(!date.is_empty(), "date must be non-empty");
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("date must be YYYY-MM-DD (got {:?}): {e}", self.date))?;

        let price = self.price.trim();
        ensure!(!price.is_empty(), "price must be non-empty");
        let price: f64 = price
            .parse()
            .map_err(|_| anyhow::anyhow!("price must be a number (got {:?})", self.price))?;
        ensure!(price.is_finite() && price > 0.0, "price must be positive (got {price})");

        let quantity = self.quantity.trim();
        ensure!(!quantity.is_empty(), "quantity must be non-empty");
        let quantity: f64 = quantity
            .parse()
            .map_err(|_| anyhow::anyhow!("quantity must be a number (got {:?})", self.quantity))?;
        ensure!(
            quantity.is_finite() && quantity >= 1.0,
            "quantity must be at least 1 (got {quantity})"
        );

        Ok(LedgerEntry {
            date,
            price,
            // Fractional quantities are truncated, matching the form's
            // whole-share semantics.
            quantity: quantity.trunc() as u32,
        })
    }
}

/// Derived statistics over the full ledger plus the current quoted price.
/// Recomputed from scratch on every change, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub total_quantity: u64,
    pub total_investment: f64,
    /// `None` when the ledger is empty. The average is undefined at zero
    /// quantity and a NaN must not reach the display layer.
    pub average_price: Option<f64>,
    pub market_value: f64,
    pub total_return: f64,
}

impl LedgerSummary {
    /// Monetary fields rounded to 2 decimals for display. Accumulation in
    /// [`compute_summary`] stays unrounded.
    pub fn rounded(&self) -> Self {
        Self {
            total_quantity: self.total_quantity,
            total_investment: round2(self.total_investment),
            average_price: self.average_price.map(round2),
            market_value: round2(self.market_value),
            total_return: round2(self.total_return),
        }
    }
}

pub fn compute_summary(entries: &[LedgerEntry], current_price: f64) -> LedgerSummary {
    let total_quantity: u64 = entries.iter().map(|e| u64::from(e.quantity)).sum();
    let total_investment: f64 = entries
        .iter()
        .map(|e| e.price * f64::from(e.quantity))
        .sum();

    let average_price = if total_quantity == 0 {
        None
    } else {
        Some(total_investment / total_quantity as f64)
    };

    let market_value = total_quantity as f64 * current_price;

    LedgerSummary {
        total_quantity,
        total_investment,
        average_price,
        market_value,
        total_return: market_value - total_investment,
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
