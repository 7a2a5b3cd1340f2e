//! Deterministic rule-based fallback analyzer
//!
//! The unconditional backstop of the pipeline: a pure, total mapping from
//! any valid [`Score`] to an [`AnalysisResult`]. No network, no failure
//! modes. When the narrative service is down this is what keeps the
//! system answering.

use advisor_core::{Action, AnalysisResult, AnalysisSource, Score};
use chrono::Utc;

/// Composite scores at or above this recommend buying
pub const BUY_THRESHOLD: f64 = 0.70;

/// Composite scores at or above this (but below buy) recommend holding
pub const HOLD_THRESHOLD: f64 = 0.40;

/// Map a composite score onto an action via the fixed threshold table
pub fn action_for(composite: f64) -> Action {
    if composite >= BUY_THRESHOLD {
        Action::Buy
    } else if composite >= HOLD_THRESHOLD {
        Action::Hold
    } else {
        Action::Sell
    }
}

/// Produce a rule-based analysis for a scored ticker.
///
/// Confidence is the composite score unchanged. The reason names the one
/// or two metrics with the largest weighted contribution so the output is
/// never opaque boilerplate.
pub fn fallback(ticker: &str, score: &Score) -> AnalysisResult {
    let action = action_for(score.composite);
    let reason = build_reason(score, action);

    AnalysisResult {
        ticker: ticker.to_uppercase(),
        action,
        confidence: score.composite,
        reason,
        source: AnalysisSource::RuleBased,
        generated_at: Utc::now(),
        score: score.clone(),
    }
}

fn build_reason(score: &Score, action: Action) -> String {
    let top = score.top_contributors();

    let drivers = match top.as_slice() {
        [] => "no individual metric was available to single out".to_string(),
        [only] => format!(
            "driven chiefly by {} (sub-score {:.2})",
            only.metric.label(),
            only.sub_score
        ),
        [first, second, ..] => format!(
            "driven chiefly by {} (sub-score {:.2}) and {} (sub-score {:.2})",
            first.metric.label(),
            first.sub_score,
            second.metric.label(),
            second.sub_score
        ),
    };

    format!(
        "Rule-based {} assessment: composite score {:.2} points to {}, {}.",
        score.style, score.composite, action, drivers
    )
}
