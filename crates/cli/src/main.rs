use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tickerdesk_core::cache::manager::PredictionCache;
use tickerdesk_core::cache::store::{JsonFileStore, KeyValueStore};
use tickerdesk_core::config::Settings;
use tickerdesk_core::domain::advice::Advice;
use tickerdesk_core::domain::ledger::{compute_summary, LedgerEntry, RawLedgerEntry};
use tickerdesk_core::fetch::history::{self, HttpHistoryProvider};
use tickerdesk_core::fetch::prediction::HttpPredictionProvider;
use tickerdesk_core::fetch::recommendation::{self, HttpRecommendationProvider};
use tickerdesk_core::render::{ChartController, ChartDataset, ChartSpec};

mod chart;

const DEFAULT_CACHE_PATH: &str = "tickerdesk_cache.json";

#[derive(Debug, Parser)]
#[command(name = "tickerdesk")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show price history, predictions and a recommendation for one ticker.
    Quote {
        #[arg(long)]
        ticker: String,

        /// Override today's date (YYYY-MM-DD) for the prediction targets.
        #[arg(long)]
        as_of: Option<String>,

        /// Skip the prediction fetch and cache entirely.
        #[arg(long)]
        no_predictions: bool,

        /// Prediction cache file. Defaults to CACHE_PATH, then a file in the
        /// working directory.
        #[arg(long)]
        cache_path: Option<String>,
    },
    /// Compute trade-table statistics over logged entries.
    Ledger {
        /// Trade row as DATE:PRICE:QUANTITY, repeatable; order is kept.
        #[arg(long = "entry")]
        entries: Vec<String>,

        /// Current quoted price used for market value and return.
        #[arg(long)]
        current_price: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Quote {
            ticker,
            as_of,
            no_predictions,
            cache_path,
        } => run_quote(&ticker, as_of.as_deref(), no_predictions, cache_path).await,
        Command::Ledger {
            entries,
            current_price,
        } => run_ledger(&entries, current_price),
    }
}

async fn run_quote(
    ticker: &str,
    as_of: Option<&str>,
    no_predictions: bool,
    cache_path: Option<String>,
) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    let now = resolve_now(as_of)?;

    let history_provider = HttpHistoryProvider::from_settings(&settings)?;
    let closes = history::daily_closes_or_empty(&history_provider, ticker).await;

    let mut datasets = vec![ChartDataset {
        label: format!("{ticker} close"),
        series: closes,
    }];

    if !no_predictions {
        let provider = Arc::new(HttpPredictionProvider::from_settings(&settings)?);
        let path = cache_path
            .or_else(|| settings.cache_path.clone())
            .unwrap_or_else(|| DEFAULT_CACHE_PATH.to_string());
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(path));
        let cache = PredictionCache::new(provider, store);

        datasets.push(ChartDataset {
            label: format!("{ticker} predicted"),
            series: cache.get_prediction(ticker, now).await,
        });
    }

    // The chart is only drawn once the history fetch (and, when shown, the
    // prediction fetch) has settled.
    let mut controller = ChartController::new(chart::TextChart);
    controller.redraw(&ChartSpec {
        ticker: ticker.to_string(),
        datasets,
    })?;

    let advice = match HttpRecommendationProvider::from_settings(&settings) {
        Ok(provider) => recommendation::recommendation_or_neutral(&provider, ticker).await,
        Err(err) => {
            tracing::warn!(error = %err, "recommendation provider not configured");
            Advice::neutral()
        }
    };
    match (advice.recommendation, advice.confidence_score) {
        (Some(recommendation), Some(confidence)) => {
            println!("recommendation: {recommendation} (confidence {confidence:.2})");
        }
        _ => println!("recommendation: unavailable"),
    }

    Ok(())
}

fn run_ledger(entries: &[String], current_price: f64) -> anyhow::Result<()> {
    anyhow::ensure!(
        current_price.is_finite() && current_price > 0.0,
        "current price must be positive (got {current_price})"
    );

    // Validation failures abort the whole command; nothing is computed over
    // a partially accepted ledger.
    let mut rows: Vec<LedgerEntry> = Vec::with_capacity(entries.len());
    for (idx, spec) in entries.iter().enumerate() {
        let row = parse_entry_spec(spec)
            .and_then(RawLedgerEntry::validate_and_into_entry)
            .with_context(|| format!("entry {} is invalid", idx + 1))?;
        rows.push(row);
    }

    for (idx, row) in rows.iter().enumerate() {
        println!(
            "{:>3}  {}  {:>12.2}  {:>8}",
            idx + 1,
            row.date,
            row.price,
            row.quantity
        );
    }

    let summary = compute_summary(&rows, current_price).rounded();
    println!("total quantity:   {}", summary.total_quantity);
    println!("total investment: {:.2}", summary.total_investment);
    match summary.average_price {
        Some(price) => println!("average price:    {price:.2}"),
        None => println!("average price:    n/a"),
    }
    println!("market value:     {:.2}", summary.market_value);
    println!("total return:     {:.2}", summary.total_return);

    Ok(())
}

fn parse_entry_spec(spec: &str) -> anyhow::Result<RawLedgerEntry> {
    let parts: Vec<&str> = spec.split(':').collect();
    anyhow::ensure!(
        parts.len() == 3,
        "expected DATE:PRICE:QUANTITY (got {spec:?})"
    );
    Ok(RawLedgerEntry {
        date: parts[0].to_string(),
        price: parts[1].to_string(),
        quantity: parts[2].to_string(),
    })
}

fn resolve_now(as_of: Option<&str>) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    let Some(s) = as_of else {
        return Ok(chrono::Utc::now());
    };
    let date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("--as-of must be YYYY-MM-DD (got {s:?})"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight for --as-of date")?;
    Ok(midnight.and_utc())
}
