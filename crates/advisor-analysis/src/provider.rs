//! Data-provider boundary
//!
//! The pipeline treats raw financial-data retrieval as a black box behind
//! [`DataProvider`]. Implementations must map their payloads onto the
//! fixed metric vocabulary and leave anything they cannot supply absent —
//! never defaulted to zero. A reqwest-backed REST implementation ships as
//! the default; tests inject mocks.

use advisor_core::{DividendPoint, Metric, TickerSnapshot};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failures at the provider boundary
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The ticker does not exist (bad input; never retried)
    #[error("ticker not found: {0}")]
    NotFound(String),

    /// Transient failure worth retrying (network, rate limit, 5xx)
    #[error("transient provider error: {0}")]
    Transient(String),
}

/// Source of raw financial snapshots
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch the current snapshot for a ticker
    async fn fetch_snapshot(&self, ticker: &str) -> Result<TickerSnapshot, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// REST data provider speaking a plain JSON fundamentals endpoint
/// (`GET {base_url}/fundamentals/{ticker}`).
#[derive(Debug, Clone)]
pub struct RestDataProvider {
    client: Client,
    base_url: String,
}

impl RestDataProvider {
    /// Create a provider over a base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DataProvider for RestDataProvider {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<TickerSnapshot, ProviderError> {
        let ticker = ticker.to_uppercase();
        let url = format!("{}/fundamentals/{}", self.base_url, ticker);
        debug!(%ticker, %url, "fetching snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ProviderError::NotFound(ticker));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Transient(format!("HTTP {status}: {body}")));
        }

        let payload: FundamentalsPayload = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("malformed payload: {e}")))?;

        Ok(payload.into_snapshot(&ticker))
    }

    fn name(&self) -> &str {
        "rest"
    }
}

/// Wire shape of the fundamentals endpoint. Every metric is optional;
/// missing fields simply stay out of the snapshot.
#[derive(Debug, Deserialize)]
pub struct FundamentalsPayload {
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    pub roe: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub profit_margin: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    #[serde(default)]
    pub dividends: Vec<DividendEntry>,
}

/// One year of dividends on the wire
#[derive(Debug, Deserialize)]
pub struct DividendEntry {
    pub year: i32,
    pub amount: f64,
}

impl FundamentalsPayload {
    fn into_snapshot(self, ticker: &str) -> TickerSnapshot {
        let as_of = self.as_of.unwrap_or_else(|| Utc::now().date_naive());
        let mut snapshot = TickerSnapshot::new(ticker, as_of);

        let fields = [
            (Metric::Roe, self.roe),
            (Metric::DebtToEquity, self.debt_to_equity),
            (Metric::ProfitMargin, self.profit_margin),
            (Metric::PeRatio, self.pe_ratio),
            (Metric::ForwardPe, self.forward_pe),
            (Metric::PbRatio, self.pb_ratio),
            (Metric::Eps, self.eps),
            (Metric::RevenueGrowth, self.revenue_growth),
            (Metric::EarningsGrowth, self.earnings_growth),
            (Metric::PegRatio, self.peg_ratio),
            (Metric::DividendYield, self.dividend_yield),
            (Metric::PayoutRatio, self.payout_ratio),
            (Metric::OperatingCashFlow, self.operating_cash_flow),
        ];

        for (metric, value) in fields {
            if let Some(value) = value {
                snapshot.metrics.insert(metric, value);
            }
        }

        let mut history: Vec<DividendPoint> = self
            .dividends
            .into_iter()
            .map(|entry| DividendPoint {
                year: entry.year,
                amount: entry.amount,
            })
            .collect();
        history.sort_by_key(|point| point.year);
        snapshot.dividend_history = history;

        snapshot
    }
}
