/// Velocity Calculator
///
/// Pure per-minute rate computation over a window of whole buckets. No
/// mutable state lives here, so rates are deterministic for any synthetic
/// bucket history.
use chrono::{DateTime, Utc};

use crate::models::{KindCounts, VelocityMetrics};
use crate::services::aggregator::ContentAggregate;

/// Rates over the most recent `window_minutes` of an aggregate's buckets
pub fn compute(
    aggregate: &ContentAggregate,
    window_minutes: u64,
    now: DateTime<Utc>,
) -> VelocityMetrics {
    rates_from_counts(&aggregate.window_counts(now, window_minutes), window_minutes)
}

/// Per-minute rates for a pre-summed window of counts.
///
/// `engagement_velocity` is the engagement rate (likes + comments + shares
/// per minute) normalized by view velocity; it is 0 when no views were
/// observed in the window, rather than dividing by zero.
pub fn rates_from_counts(counts: &KindCounts, window_minutes: u64) -> VelocityMetrics {
    let window = window_minutes.max(1) as f64;

    let views_per_minute = counts.views as f64 / window;
    let likes_per_minute = counts.likes as f64 / window;
    let comments_per_minute = counts.comments as f64 / window;

    let engagement_velocity = if views_per_minute > 0.0 {
        (counts.engagements() as f64 / window) / views_per_minute
    } else {
        0.0
    };

    VelocityMetrics {
        views_per_minute,
        likes_per_minute,
        comments_per_minute,
        engagement_velocity,
    }
}
