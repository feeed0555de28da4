use chrono::{DateTime, Utc};
use event_schema::EngagementKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-kind counter block used for cumulative totals, per-platform
/// breakdowns and metric buckets alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

impl KindCounts {
    /// Count one engagement of the given kind
    pub fn apply(&mut self, kind: EngagementKind) {
        match kind {
            EngagementKind::View => self.views += 1,
            EngagementKind::Like => self.likes += 1,
            EngagementKind::Comment => self.comments += 1,
            EngagementKind::Share => self.shares += 1,
        }
    }

    /// Likes + comments + shares (everything except views)
    pub fn engagements(&self) -> u64 {
        self.likes + self.comments + self.shares
    }

    pub fn total(&self) -> u64 {
        self.views + self.engagements()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(&mut self, other: &KindCounts) {
        self.views += other.views;
        self.likes += other.likes;
        self.comments += other.comments;
        self.shares += other.shares;
    }

    /// Engagements per view, clamped to [0, 1]
    pub fn engagement_rate(&self) -> f64 {
        let rate = self.engagements() as f64 / (self.views.max(1)) as f64;
        rate.clamp(0.0, 1.0)
    }
}

/// Point-in-time analytics snapshot for one content item.
///
/// Cumulative counters are monotonically non-decreasing; `realtime_views`
/// covers only the most recent realtime window and so rises and falls with
/// current activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveAnalytics {
    pub content_id: String,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    /// Views inside the realtime window (default: last 5 minutes)
    pub realtime_views: u64,
    /// Engagements per view, in [0, 1]
    pub engagement_rate: f64,
    pub platform_breakdown: HashMap<String, KindCounts>,
    pub last_updated: DateTime<Utc>,
    /// True while the item is subscribed and events arrived recently
    pub is_live: bool,
}
