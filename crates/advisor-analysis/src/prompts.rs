//! Narrative prompt templates
//!
//! The prompt sent to the completion service is a fixed template
//! interpolated with the scored metrics, their sub-scores and the
//! composite — deterministic for a given (snapshot, score) pair. The
//! guardrail section keeps the model anchored to the supplied figures.

use advisor_core::{InvestorStyle, Metric, Score, TickerSnapshot};
use minijinja::Environment;
use serde_json::json;

/// System instruction per investor style
pub fn system_prompt(style: InvestorStyle) -> &'static str {
    match style {
        InvestorStyle::Growth => {
            "You are an equity analyst specializing in growth investing. \
             You weigh expansion of revenue and earnings above all, judge \
             valuation relative to growth, and you write tight, factual prose."
        }
        InvestorStyle::Value => {
            "You are an equity analyst specializing in value investing. \
             You look for a margin of safety in the price paid for assets \
             and earnings, and you write tight, factual prose."
        }
        InvestorStyle::Dividend => {
            "You are an equity analyst specializing in dividend investing. \
             You care about income durability more than headline yield, and \
             you write tight, factual prose."
        }
    }
}

const NARRATIVE_TEMPLATE: &str = r"Assess the fundamentals of {{ ticker }} for a {{ style }} investor.

Scored metrics:
{% for row in scored -%}
- {{ row.label }}: {{ row.value }} (sub-score {{ row.sub_score }})
{% endfor -%}
{% if context %}
Additional context:
{% for row in context -%}
- {{ row.label }}: {{ row.value }}
{% endfor -%}
{% endif %}
Composite {{ style }} score: {{ composite }}

Ground rules:
1. Never state a figure that is not listed above.
2. Where a value reads N/A, say the data is insufficient to judge that factor.
3. Reply with a single dense paragraph weighing strengths against risks, closing with your overall stance.
";

/// Render the narrative prompt for a scored snapshot
pub fn render_narrative_prompt(
    snapshot: &TickerSnapshot,
    score: &Score,
) -> Result<String, minijinja::Error> {
    let scored: Vec<serde_json::Value> = score
        .breakdown
        .iter()
        .map(|entry| {
            json!({
                "label": entry.metric.label(),
                "value": format_metric_value(entry.metric, entry.value),
                "sub_score": entry
                    .value
                    .map_or_else(|| "n/a".to_string(), |_| format!("{:.2}", entry.sub_score)),
            })
        })
        .collect();

    // Unscored snapshot metrics still go in as context; the model should
    // see the same picture the caller does
    let context: Vec<serde_json::Value> = snapshot
        .metrics
        .iter()
        .filter(|(metric, _)| !score.breakdown.iter().any(|e| e.metric == **metric))
        .map(|(metric, value)| {
            json!({
                "label": metric.label(),
                "value": format_metric_value(*metric, Some(*value)),
            })
        })
        .collect();

    let env = Environment::new();
    env.render_named_str(
        "narrative",
        NARRATIVE_TEMPLATE,
        json!({
            "ticker": snapshot.ticker,
            "style": score.style.as_str(),
            "scored": scored,
            "context": context,
            "composite": format!("{:.2}", score.composite),
        }),
    )
}

/// Render one raw metric value the way an analyst would quote it
fn format_metric_value(metric: Metric, value: Option<f64>) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };

    match metric {
        Metric::Roe
        | Metric::ProfitMargin
        | Metric::RevenueGrowth
        | Metric::EarningsGrowth
        | Metric::DividendYield
        | Metric::PayoutRatio => format!("{:.2}%", value * 100.0),
        Metric::OperatingCashFlow => format_cash(value),
        Metric::DividendGrowthStreak => format!("{} consecutive years of increases", value as u32),
        Metric::PeRatio
        | Metric::ForwardPe
        | Metric::PbRatio
        | Metric::PegRatio
        | Metric::DebtToEquity
        | Metric::Eps => format!("{value:.2}"),
    }
}

/// Format a cash amount in human-readable form
fn format_cash(amount: f64) -> String {
    let magnitude = amount.abs();
    if magnitude >= 1_000_000_000_000.0 {
        format!("${:.2}T", amount / 1_000_000_000_000.0)
    } else if magnitude >= 1_000_000_000.0 {
        format!("${:.2}B", amount / 1_000_000_000.0)
    } else if magnitude >= 1_000_000.0 {
        format!("${:.2}M", amount / 1_000_000.0)
    } else {
        format!("${amount:.2}")
    }
}
