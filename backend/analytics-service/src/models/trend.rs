use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short-horizon engagement rates derived from bucket history.
///
/// All rates are per minute over the requested window; `engagement_velocity`
/// is the engagement rate normalized by view velocity and is 0 when no views
/// were observed in the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityMetrics {
    pub views_per_minute: f64,
    pub likes_per_minute: f64,
    pub comments_per_minute: f64,
    pub engagement_velocity: f64,
}

/// Latest trend estimate for one content item.
///
/// Recomputed on every evaluation tick from bucket history; only the latest
/// value is kept since history is reconstructable from the buckets. This is
/// an estimator with an explainable shape, not a forecast guarantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub content_id: String,
    /// Bounded combination of velocity and positive acceleration, in [0, 100]
    pub trend_score: f64,
    /// Recent views per minute, clamped to a display ceiling
    pub velocity_score: f64,
    /// Velocity change relative to the preceding window
    pub acceleration: f64,
    pub current_views: u64,
    /// Linear extrapolation of views; never below `current_views`
    pub projected_views: u64,
    /// Estimated seconds until the trending-views threshold is reached;
    /// `Some(0)` when already past it, `None` when velocity is zero
    pub time_to_trend_seconds: Option<u64>,
    /// Estimator confidence in [0, 1]
    pub confidence: f64,
    pub computed_at: DateTime<Utc>,
}
