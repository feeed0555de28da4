/// Trend Detector
///
/// Combines short-horizon velocity signals into a bounded trend score, a
/// projected-view estimate and a confidence value. The score is a monotone,
/// explainable function of recent history, not a forecast guarantee: flat or
/// declining velocity scores low regardless of absolute volume, rewarding
/// acceleration over magnitude.
use chrono::{DateTime, Utc};

use crate::config::TrendConfig;
use crate::models::TrendSnapshot;
use crate::services::aggregator::ContentAggregate;

/// Floor for the acceleration denominator so a cold prior window does not
/// produce unbounded ratios
const ACCELERATION_EPSILON: f64 = 1.0;

/// Recompute the trend estimate from an aggregate's bucket history.
///
/// Steps:
/// 1. Velocity over two adjacent windows (recent W minutes vs. the W
///    minutes before them) yields relative acceleration
///    `(recent - prior) / max(prior, ε)`.
/// 2. `velocity_score` is the recent views/minute, clamped for display.
/// 3. `trend_score` = 100 × (w_v × sat(velocity) + w_a × sat(acceleration⁺))
///    with saturating normalization `sat(x) = x / (x + scale)`, clamped to
///    [0, 100].
/// 4. `projected_views` extrapolates linearly over the projection horizon
///    and never falls below current views.
/// 5. Confidence grows with the number of non-empty buckets observed and
///    shrinks with the coefficient of variation of per-bucket view counts.
pub fn detect(
    aggregate: &ContentAggregate,
    config: &TrendConfig,
    now: DateTime<Utc>,
) -> TrendSnapshot {
    let window = config.window_minutes.max(1);

    let recent = aggregate.window_counts(now, window);
    let prior = aggregate.previous_window_counts(now, window);

    let recent_vpm = recent.views as f64 / window as f64;
    let prior_vpm = prior.views as f64 / window as f64;

    let acceleration = (recent_vpm - prior_vpm) / prior_vpm.max(ACCELERATION_EPSILON);

    let velocity_component = saturate(recent_vpm, config.velocity_scale);
    let acceleration_component = saturate(acceleration.max(0.0), config.acceleration_scale);

    let trend_score = (100.0
        * (config.velocity_weight * velocity_component
            + config.acceleration_weight * acceleration_component))
        .clamp(0.0, 100.0);

    let total_views = aggregate.total_views();
    let projected = total_views as f64 + recent_vpm * config.projection_horizon_minutes as f64;
    let projected_views = (projected.round() as u64).max(total_views);

    TrendSnapshot {
        content_id: aggregate.content_id().to_string(),
        trend_score,
        velocity_score: recent_vpm.min(config.velocity_ceiling),
        acceleration,
        current_views: total_views,
        projected_views,
        time_to_trend_seconds: time_to_trend(total_views, recent_vpm, config),
        confidence: confidence(aggregate, config),
        computed_at: now,
    }
}

/// Monotone normalization onto [0, 1): 0.5 at `scale`, approaching 1
fn saturate(value: f64, scale: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    value / (value + scale)
}

/// Seconds until cumulative views reach the trending threshold at the
/// current velocity. `Some(0)` once past the threshold, `None` while the
/// item has no measurable view velocity.
fn time_to_trend(total_views: u64, views_per_minute: f64, config: &TrendConfig) -> Option<u64> {
    if total_views >= config.trending_views_threshold {
        return Some(0);
    }
    if views_per_minute <= 0.0 {
        return None;
    }

    let remaining = (config.trending_views_threshold - total_views) as f64;
    Some((remaining / views_per_minute * 60.0).round() as u64)
}

/// More history raises confidence; a noisy series lowers it.
///
/// `history = min(non_empty_buckets / target, 1)` and
/// `stability = 1 / (1 + cv)` where cv is the coefficient of variation of
/// per-bucket view counts. The product is clamped to [0, 1] and capped.
fn confidence(aggregate: &ContentAggregate, config: &TrendConfig) -> f64 {
    let samples = aggregate.non_empty_bucket_views();
    if samples.is_empty() {
        return 0.0;
    }

    let history =
        (samples.len() as f64 / config.confidence_target_buckets.max(1) as f64).min(1.0);

    let mean = samples.iter().sum::<u64>() as f64 / samples.len() as f64;
    let cv = if mean > 0.0 {
        let variance = samples
            .iter()
            .map(|&v| {
                let diff = v as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / samples.len() as f64;
        variance.sqrt() / mean
    } else {
        0.0
    };

    (history / (1.0 + cv)).clamp(0.0, 1.0).min(config.confidence_cap)
}
