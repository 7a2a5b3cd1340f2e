//! Value types flowing through the analysis pipeline

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fixed vocabulary of financial metrics understood by the scoring engine.
///
/// Data providers must map their payloads onto these names; anything they
/// cannot supply is simply omitted from the snapshot, never defaulted to
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Roe,
    DebtToEquity,
    ProfitMargin,
    PeRatio,
    ForwardPe,
    PbRatio,
    Eps,
    RevenueGrowth,
    EarningsGrowth,
    PegRatio,
    DividendYield,
    PayoutRatio,
    OperatingCashFlow,
    /// Derived from the dividend history, not supplied by providers
    DividendGrowthStreak,
}

impl Metric {
    /// Human-readable label used in prompts and fallback reasons
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Roe => "return on equity",
            Metric::DebtToEquity => "debt-to-equity ratio",
            Metric::ProfitMargin => "profit margin",
            Metric::PeRatio => "P/E ratio",
            Metric::ForwardPe => "forward P/E ratio",
            Metric::PbRatio => "P/B ratio",
            Metric::Eps => "earnings per share",
            Metric::RevenueGrowth => "revenue growth",
            Metric::EarningsGrowth => "earnings growth",
            Metric::PegRatio => "PEG ratio",
            Metric::DividendYield => "dividend yield",
            Metric::PayoutRatio => "payout ratio",
            Metric::OperatingCashFlow => "operating cash flow",
            Metric::DividendGrowthStreak => "dividend growth streak",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One year of dividend payments, summed over the calendar year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendPoint {
    pub year: i32,
    pub amount: f64,
}

/// Immutable bundle of raw financial figures for one ticker on one day.
///
/// Produced by the external data provider, owned by the raw cache tier for
/// its TTL window, otherwise ephemeral per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    /// Ticker symbol, uppercase
    pub ticker: String,

    /// Trading day the figures describe (UTC)
    pub as_of: NaiveDate,

    /// Named metrics; a missing key means the metric is unavailable
    pub metrics: BTreeMap<Metric, f64>,

    /// Annual dividend totals, ascending by year
    #[serde(default)]
    pub dividend_history: Vec<DividendPoint>,
}

impl TickerSnapshot {
    /// Create an empty snapshot for a ticker (symbol is uppercased)
    pub fn new(ticker: impl Into<String>, as_of: NaiveDate) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            as_of,
            metrics: BTreeMap::new(),
            dividend_history: Vec::new(),
        }
    }

    /// Insert a metric value, consuming and returning self for chaining
    pub fn with_metric(mut self, metric: Metric, value: f64) -> Self {
        self.metrics.insert(metric, value);
        self
    }

    /// Attach the dividend history
    pub fn with_dividends(mut self, history: Vec<DividendPoint>) -> Self {
        self.dividend_history = history;
        self
    }

    /// Look up a single metric
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }

    /// True when the provider returned nothing usable at all
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.dividend_history.is_empty()
    }
}

/// Investor style selecting which metrics matter and how they are weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestorStyle {
    Growth,
    Value,
    Dividend,
}

impl InvestorStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestorStyle::Growth => "growth",
            InvestorStyle::Value => "value",
            InvestorStyle::Dividend => "dividend",
        }
    }

    /// All styles, in a fixed order
    pub fn all() -> [InvestorStyle; 3] {
        [
            InvestorStyle::Growth,
            InvestorStyle::Value,
            InvestorStyle::Dividend,
        ]
    }
}

impl fmt::Display for InvestorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestorStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "growth" => Ok(InvestorStyle::Growth),
            "value" => Ok(InvestorStyle::Value),
            "dividend" => Ok(InvestorStyle::Dividend),
            other => Err(format!(
                "unknown investor style '{other}' (expected growth, value or dividend)"
            )),
        }
    }
}

/// Recommended action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Hold,
    Sell,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "buy",
            Action::Hold => "hold",
            Action::Sell => "sell",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the narrative of an [`AnalysisResult`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Llm,
    RuleBased,
}

/// One metric's contribution to a composite score.
///
/// `weight` is the weight actually applied, after redistribution of any
/// unavailable metrics' weights; `value` is kept (even for absent metrics)
/// so callers can render a complete breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: Metric,
    pub value: Option<f64>,
    pub sub_score: f64,
    pub weight: f64,
}

impl MetricScore {
    /// Weighted contribution to the composite (zero for absent metrics)
    pub fn contribution(&self) -> f64 {
        if self.value.is_some() {
            self.sub_score * self.weight
        } else {
            0.0
        }
    }
}

/// Style-specific composite score with its full per-metric breakdown.
///
/// Derived deterministically from a [`TickerSnapshot`] plus a style;
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub style: InvestorStyle,

    /// Weighted sum of sub-scores, in [0.0, 1.0]
    pub composite: f64,

    pub breakdown: Vec<MetricScore>,
}

impl Score {
    /// Breakdown entries for available metrics, strongest contribution
    /// first. Ties break on the fixed metric order so the result is
    /// deterministic.
    pub fn top_contributors(&self) -> Vec<&MetricScore> {
        let mut present: Vec<&MetricScore> = self
            .breakdown
            .iter()
            .filter(|m| m.value.is_some())
            .collect();
        present.sort_by(|a, b| {
            b.contribution()
                .partial_cmp(&a.contribution())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.metric.cmp(&b.metric))
        });
        present
    }
}

/// The externally visible outcome of one analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: String,
    pub action: Action,

    /// The composite score, or an LLM-adjusted variant of it
    pub confidence: f64,

    /// Natural-language rationale
    pub reason: String,

    /// Truthfully records whether the narrative came from the LLM or the
    /// rule-based fallback
    pub source: AnalysisSource,

    pub generated_at: DateTime<Utc>,

    /// The score the recommendation was derived from, kept for
    /// explainability
    pub score: Score,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_snapshot_uppercases_ticker() {
        let snapshot = TickerSnapshot::new("aapl", date(2024, 3, 1));
        assert_eq!(snapshot.ticker, "AAPL");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_snapshot_metric_lookup() {
        let snapshot = TickerSnapshot::new("AAPL", date(2024, 3, 1))
            .with_metric(Metric::Roe, 0.25)
            .with_metric(Metric::PeRatio, 18.0);

        assert_eq!(snapshot.metric(Metric::Roe), Some(0.25));
        assert_eq!(snapshot.metric(Metric::PegRatio), None);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let snapshot = TickerSnapshot::new("MSFT", date(2024, 3, 1))
            .with_metric(Metric::RevenueGrowth, 0.18)
            .with_dividends(vec![
                DividendPoint { year: 2022, amount: 2.48 },
                DividendPoint { year: 2023, amount: 2.72 },
            ]);

        let json = serde_json::to_string(&snapshot).expect("serialize");
        assert!(json.contains("revenue_growth"));
        let back: TickerSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_style_parse() {
        assert_eq!("growth".parse(), Ok(InvestorStyle::Growth));
        assert_eq!("DIVIDEND".parse(), Ok(InvestorStyle::Dividend));
        assert!("momentum".parse::<InvestorStyle>().is_err());
    }

    #[test]
    fn test_action_serde_is_snake_case() {
        assert_eq!(serde_json::to_string(&Action::Buy).expect("serialize"), "\"buy\"");
        assert_eq!(
            serde_json::to_string(&AnalysisSource::RuleBased).expect("serialize"),
            "\"rule_based\""
        );
    }

    #[test]
    fn test_top_contributors_orders_by_weighted_contribution() {
        let score = Score {
            style: InvestorStyle::Growth,
            composite: 0.6,
            breakdown: vec![
                MetricScore {
                    metric: Metric::RevenueGrowth,
                    value: Some(0.18),
                    sub_score: 0.9,
                    weight: 0.35,
                },
                MetricScore {
                    metric: Metric::PegRatio,
                    value: Some(1.2),
                    sub_score: 0.65,
                    weight: 0.25,
                },
                MetricScore {
                    metric: Metric::EarningsGrowth,
                    value: None,
                    sub_score: 0.0,
                    weight: 0.0,
                },
            ],
        };

        let top = score.top_contributors();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].metric, Metric::RevenueGrowth);
        assert_eq!(top[1].metric, Metric::PegRatio);
    }
}
