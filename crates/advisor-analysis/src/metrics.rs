//! Sub-score normalization primitives
//!
//! Every raw metric value is mapped onto [0.0, 1.0] through one of the
//! response shapes below before weighting. The interpolation bounds come
//! from [`Benchmarks`](crate::config::Benchmarks) so they are tunable,
//! documented configuration rather than scattered constants.

use advisor_core::DividendPoint;

use crate::config::Benchmarks;

/// Linear ramp for higher-is-better metrics: 0.0 at or below `poor`,
/// 1.0 at or above `excellent`. Clamping at the top is the
/// diminishing-returns saturation.
pub fn ramp_up(value: f64, poor: f64, excellent: f64) -> f64 {
    if excellent <= poor {
        return 0.0;
    }
    ((value - poor) / (excellent - poor)).clamp(0.0, 1.0)
}

/// Inverted linear ramp for lower-is-better metrics: 1.0 at or below
/// `excellent`, 0.0 at or above `poor`.
pub fn ramp_down(value: f64, excellent: f64, poor: f64) -> f64 {
    if poor <= excellent {
        return 0.0;
    }
    ((poor - value) / (poor - excellent)).clamp(0.0, 1.0)
}

/// Dividend-yield response with a sustainability ceiling.
///
/// Rises linearly to 1.0 at the target yield, holds through the ceiling,
/// then falls linearly to a floor: an implausibly high yield is a risk
/// signal, not a reward.
pub fn capped_yield(value: f64, b: &Benchmarks) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    if value <= b.yield_target {
        return value / b.yield_target;
    }
    if value <= b.yield_ceiling {
        return 1.0;
    }
    if value >= b.yield_penalty_limit {
        return b.yield_penalty_floor;
    }
    let span = b.yield_penalty_limit - b.yield_ceiling;
    let progress = (value - b.yield_ceiling) / span;
    1.0 - progress * (1.0 - b.yield_penalty_floor)
}

/// Peaked payout-ratio response: 1.0 inside the plateau, falling linearly
/// to 0.0 at 0% and at 100%. Both hoarding and paying out everything
/// score poorly.
pub fn peaked_payout(value: f64, b: &Benchmarks) -> f64 {
    if value <= 0.0 || value >= 1.0 {
        return 0.0;
    }
    if value < b.payout_plateau_low {
        return value / b.payout_plateau_low;
    }
    if value <= b.payout_plateau_high {
        return 1.0;
    }
    (1.0 - value) / (1.0 - b.payout_plateau_high)
}

/// Consecutive year-over-year dividend increases, counted from the most
/// recent year backwards inside the benchmark window.
///
/// Returns `None` when the history is too short to assess growth at all.
pub fn dividend_growth_streak(history: &[DividendPoint], window_years: usize) -> Option<u32> {
    if history.len() < 2 {
        return None;
    }

    // History is ascending by year; look at the most recent `window_years`
    let start = history.len().saturating_sub(window_years);
    let recent = &history[start..];

    let mut streak = 0u32;
    for pair in recent.windows(2).rev() {
        if pair[1].amount > pair[0].amount {
            streak += 1;
        } else {
            break;
        }
    }
    Some(streak)
}

/// Normalize a streak count over the possible increases in the window
pub fn streak_sub_score(streak: u32, window_years: usize) -> f64 {
    let max_increases = window_years.saturating_sub(1).max(1) as f64;
    (f64::from(streak) / max_increases).clamp(0.0, 1.0)
}
