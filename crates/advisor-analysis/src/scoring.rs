//! Style-specific composite scoring
//!
//! `score` is a pure function of (snapshot, style, benchmarks): no clock,
//! no I/O, no hidden state, so the same inputs always produce bit-identical
//! output. Each investor style carries a static weight table over the
//! metric vocabulary; adding a style means adding a table entry, checked
//! at compile time by the closed enum match.

use advisor_core::{
    AnalysisError, InvestorStyle, Metric, MetricScore, Result, Score, TickerSnapshot,
};

use crate::config::Benchmarks;
use crate::metrics;

/// Base weight table for a style. Weights sum to 1.0 per style.
pub fn style_weights(style: InvestorStyle) -> &'static [(Metric, f64)] {
    match style {
        InvestorStyle::Growth => &[
            (Metric::RevenueGrowth, 0.35),
            (Metric::EarningsGrowth, 0.25),
            (Metric::PegRatio, 0.25),
            (Metric::Roe, 0.15),
        ],
        InvestorStyle::Value => &[
            (Metric::PeRatio, 0.40),
            (Metric::PbRatio, 0.30),
            (Metric::DebtToEquity, 0.30),
        ],
        InvestorStyle::Dividend => &[
            (Metric::DividendYield, 0.40),
            (Metric::PayoutRatio, 0.35),
            (Metric::DividendGrowthStreak, 0.25),
        ],
    }
}

/// Resolve a metric's raw value from the snapshot.
///
/// The growth streak is derived from the dividend history; everything else
/// comes straight off the metric map. An absent key stays absent.
fn metric_value(snapshot: &TickerSnapshot, metric: Metric, b: &Benchmarks) -> Option<f64> {
    match metric {
        Metric::DividendGrowthStreak => {
            metrics::dividend_growth_streak(&snapshot.dividend_history, b.streak_window_years)
                .map(f64::from)
        }
        other => snapshot.metric(other),
    }
}

/// Normalize one raw metric value to a sub-score in [0.0, 1.0]
fn sub_score(metric: Metric, value: f64, b: &Benchmarks) -> f64 {
    match metric {
        Metric::Roe => metrics::ramp_up(value, b.roe_poor, b.roe_excellent),
        Metric::RevenueGrowth | Metric::EarningsGrowth => {
            metrics::ramp_up(value, b.growth_poor, b.growth_excellent)
        }
        Metric::ProfitMargin => metrics::ramp_up(value, b.margin_poor, b.margin_excellent),
        // Non-positive P/E and PEG mean negative earnings; never a value signal
        Metric::PeRatio | Metric::ForwardPe => {
            if value <= 0.0 {
                0.0
            } else {
                metrics::ramp_down(value, b.pe_excellent, b.pe_poor)
            }
        }
        Metric::PegRatio => {
            if value <= 0.0 {
                0.0
            } else {
                metrics::ramp_down(value, b.peg_excellent, b.peg_poor)
            }
        }
        Metric::PbRatio => metrics::ramp_down(value, b.pb_excellent, b.pb_poor),
        Metric::DebtToEquity => metrics::ramp_down(value, b.de_excellent, b.de_poor),
        Metric::DividendYield => metrics::capped_yield(value, b),
        Metric::PayoutRatio => metrics::peaked_payout(value, b),
        Metric::DividendGrowthStreak => {
            metrics::streak_sub_score(value as u32, b.streak_window_years)
        }
        Metric::Eps | Metric::OperatingCashFlow => {
            if value > 0.0 { 1.0 } else { 0.0 }
        }
    }
}

/// Compute the style-specific composite score for a snapshot.
///
/// When a metric is unavailable its weight is redistributed
/// proportionally: each remaining weight is divided by the sum of the
/// available base weights, so applied weights always sum to 1.0. With no
/// available metrics at all there is nothing meaningful to report and the
/// call fails with `InsufficientData`.
pub fn score(snapshot: &TickerSnapshot, style: InvestorStyle, b: &Benchmarks) -> Result<Score> {
    let table = style_weights(style);

    let available_weight: f64 = table
        .iter()
        .filter(|(metric, _)| metric_value(snapshot, *metric, b).is_some())
        .map(|(_, weight)| weight)
        .sum();

    if available_weight <= 0.0 {
        return Err(AnalysisError::InsufficientData(format!(
            "no {} metrics available for {}",
            style, snapshot.ticker
        )));
    }

    let mut breakdown = Vec::with_capacity(table.len());
    let mut composite = 0.0;

    for &(metric, base_weight) in table {
        match metric_value(snapshot, metric, b) {
            Some(value) => {
                let sub = sub_score(metric, value, b);
                let weight = base_weight / available_weight;
                composite += sub * weight;
                breakdown.push(MetricScore {
                    metric,
                    value: Some(value),
                    sub_score: sub,
                    weight,
                });
            }
            None => breakdown.push(MetricScore {
                metric,
                value: None,
                sub_score: 0.0,
                weight: 0.0,
            }),
        }
    }

    Ok(Score {
        style,
        composite: composite.clamp(0.0, 1.0),
        breakdown,
    })
}
