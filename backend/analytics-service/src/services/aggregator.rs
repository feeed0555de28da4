/// Per-Content Aggregator
///
/// Single-writer accumulator for one content item: cumulative counters,
/// per-platform breakdown and fixed-width metric buckets for sliding-window
/// computation. Ownership discipline is enforced by the engine (each
/// aggregate lives behind a per-key lock), so nothing in here needs its own
/// synchronization.
use chrono::{DateTime, Duration, Utc};
use event_schema::EngagementEvent;
use std::collections::{BTreeMap, HashMap};

use crate::config::EngineConfig;
use crate::models::{KindCounts, LiveAnalytics};

pub struct ContentAggregate {
    content_id: String,
    totals: KindCounts,
    platform_totals: HashMap<String, KindCounts>,
    /// bucket start (unix seconds, truncated to bucket width) -> per-platform
    /// counts; one logical MetricBucket per (platform, bucket_start)
    buckets: BTreeMap<i64, HashMap<String, KindCounts>>,
    last_event_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    /// Highest milestone boundary already announced for this item
    highest_milestone: u64,
    bucket_width_secs: i64,
    retention_secs: i64,
}

impl ContentAggregate {
    pub fn new(content_id: impl Into<String>, config: &EngineConfig, now: DateTime<Utc>) -> Self {
        Self {
            content_id: content_id.into(),
            totals: KindCounts::default(),
            platform_totals: HashMap::new(),
            buckets: BTreeMap::new(),
            last_event_at: None,
            created_at: now,
            highest_milestone: 0,
            bucket_width_secs: config.bucket_width_seconds as i64,
            retention_secs: (config.retention_minutes * 60) as i64,
        }
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    fn bucket_start(&self, at: DateTime<Utc>) -> i64 {
        at.timestamp().div_euclid(self.bucket_width_secs) * self.bucket_width_secs
    }

    /// Apply one validated event: O(1) bucket update plus cumulative
    /// counters. Stale buckets are pruned lazily here and eagerly on the
    /// scheduler tick.
    pub fn apply(&mut self, event: &EngagementEvent, now: DateTime<Utc>) {
        let slot = self.bucket_start(event.occurred_at);

        self.buckets
            .entry(slot)
            .or_default()
            .entry(event.platform.clone())
            .or_default()
            .apply(event.kind);

        self.totals.apply(event.kind);
        self.platform_totals
            .entry(event.platform.clone())
            .or_default()
            .apply(event.kind);

        self.last_event_at = Some(match self.last_event_at {
            Some(prev) => prev.max(now),
            None => now,
        });

        self.prune(now);
    }

    /// Drop buckets that fell out of the retention window
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = self.bucket_start(now) + self.bucket_width_secs - self.retention_secs;
        self.buckets.retain(|&slot, _| slot >= cutoff);
    }

    /// Sum of all platform counts for buckets with start in `[from, to)`
    /// (unix seconds)
    pub fn counts_in_range(&self, from: i64, to: i64) -> KindCounts {
        let mut total = KindCounts::default();
        for (_, platforms) in self.buckets.range(from..to) {
            for counts in platforms.values() {
                total.merge(counts);
            }
        }
        total
    }

    /// Counts over the most recent `window_minutes` of whole buckets,
    /// ending at (and including) the bucket containing `now`
    pub fn window_counts(&self, now: DateTime<Utc>, window_minutes: u64) -> KindCounts {
        let (from, to) = self.window_range(now, window_minutes);
        self.counts_in_range(from, to)
    }

    /// Counts over the window immediately preceding `window_counts`
    pub fn previous_window_counts(&self, now: DateTime<Utc>, window_minutes: u64) -> KindCounts {
        let (from, _) = self.window_range(now, window_minutes);
        let span = (window_minutes * 60) as i64;
        self.counts_in_range(from - span, from)
    }

    fn window_range(&self, now: DateTime<Utc>, window_minutes: u64) -> (i64, i64) {
        let to = self.bucket_start(now) + self.bucket_width_secs;
        let from = to - (window_minutes * 60) as i64;
        (from, to)
    }

    /// View counts per non-empty bucket, oldest first; input to the
    /// confidence estimate
    pub fn non_empty_bucket_views(&self) -> Vec<u64> {
        self.buckets
            .values()
            .filter_map(|platforms| {
                let mut combined = KindCounts::default();
                for counts in platforms.values() {
                    combined.merge(counts);
                }
                (!combined.is_empty()).then_some(combined.views)
            })
            .collect()
    }

    pub fn totals(&self) -> KindCounts {
        self.totals
    }

    pub fn total_views(&self) -> u64 {
        self.totals.views
    }

    pub fn last_event_at(&self) -> Option<DateTime<Utc>> {
        self.last_event_at
    }

    pub fn highest_milestone(&self) -> u64 {
        self.highest_milestone
    }

    pub fn record_milestone(&mut self, boundary: u64) {
        self.highest_milestone = self.highest_milestone.max(boundary);
    }

    /// True when the item has seen no events for the idle period (measured
    /// from creation if it never saw one)
    pub fn is_idle(&self, now: DateTime<Utc>, idle: Duration) -> bool {
        let reference = self.last_event_at.unwrap_or(self.created_at);
        now - reference >= idle
    }

    /// Immutable point-in-time copy of this item's analytics
    pub fn snapshot(
        &self,
        now: DateTime<Utc>,
        subscribed: bool,
        realtime_window_minutes: u64,
        freshness_minutes: u64,
    ) -> LiveAnalytics {
        let realtime_views = self.window_counts(now, realtime_window_minutes).views;

        let fresh = self
            .last_event_at
            .map(|at| now - at <= Duration::minutes(freshness_minutes as i64))
            .unwrap_or(false);

        LiveAnalytics {
            content_id: self.content_id.clone(),
            total_views: self.totals.views,
            total_likes: self.totals.likes,
            total_comments: self.totals.comments,
            total_shares: self.totals.shares,
            realtime_views,
            engagement_rate: self.totals.engagement_rate(),
            platform_breakdown: self.platform_totals.clone(),
            last_updated: self.last_event_at.unwrap_or(self.created_at),
            is_live: subscribed && fresh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use event_schema::EngagementKind;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn at_minute(minute: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 - 1_700_000_000 % 60 + minute * 60, 0)
            .unwrap()
    }

    fn view(platform: &str, at: DateTime<Utc>) -> EngagementEvent {
        EngagementEvent::new("p1", platform, EngagementKind::View, at)
    }

    #[test]
    fn test_totals_are_monotone_across_applies() {
        let now = at_minute(0);
        let mut aggregate = ContentAggregate::new("p1", &config(), now);

        let mut previous = 0;
        for i in 0..10 {
            aggregate.apply(&view("medium", at_minute(i)), at_minute(i));
            let views = aggregate.total_views();
            assert!(views >= previous);
            previous = views;
        }
        assert_eq!(aggregate.total_views(), 10);
    }

    #[test]
    fn test_buckets_split_by_platform_and_slot() {
        let now = at_minute(0);
        let mut aggregate = ContentAggregate::new("p1", &config(), now);

        aggregate.apply(&view("medium", at_minute(0)), now);
        aggregate.apply(&view("linkedin", at_minute(0)), now);
        aggregate.apply(&view("medium", at_minute(1)), at_minute(1));

        let snapshot = aggregate.snapshot(at_minute(1), false, 5, 10);
        assert_eq!(snapshot.platform_breakdown["medium"].views, 2);
        assert_eq!(snapshot.platform_breakdown["linkedin"].views, 1);
        assert_eq!(snapshot.total_views, 3);
    }

    #[test]
    fn test_window_counts_cover_exactly_the_window() {
        let mut aggregate = ContentAggregate::new("p1", &config(), at_minute(0));

        // One view per minute for 10 minutes
        for i in 0..10 {
            aggregate.apply(&view("medium", at_minute(i)), at_minute(i));
        }

        // At minute 9, a 5-minute window covers minutes 5..=9
        let window = aggregate.window_counts(at_minute(9), 5);
        assert_eq!(window.views, 5);

        let prior = aggregate.previous_window_counts(at_minute(9), 5);
        assert_eq!(prior.views, 5);
    }

    #[test]
    fn test_prune_drops_buckets_outside_retention() {
        let mut aggregate = ContentAggregate::new("p1", &config(), at_minute(0));

        aggregate.apply(&view("medium", at_minute(0)), at_minute(0));
        aggregate.apply(&view("medium", at_minute(61)), at_minute(61));

        // The minute-0 bucket is now outside the 60-minute retention window
        let all = aggregate.counts_in_range(i64::MIN, i64::MAX);
        assert_eq!(all.views, 1);

        // Cumulative totals are unaffected by pruning
        assert_eq!(aggregate.total_views(), 2);
    }

    #[test]
    fn test_realtime_views_use_the_short_window() {
        let mut aggregate = ContentAggregate::new("p1", &config(), at_minute(0));

        for i in 0..10 {
            aggregate.apply(&view("medium", at_minute(i)), at_minute(i));
        }

        let snapshot = aggregate.snapshot(at_minute(9), false, 5, 10);
        assert_eq!(snapshot.realtime_views, 5);
        assert_eq!(snapshot.total_views, 10);
    }

    #[test]
    fn test_is_live_requires_subscription_and_freshness() {
        let mut aggregate = ContentAggregate::new("p1", &config(), at_minute(0));
        aggregate.apply(&view("medium", at_minute(0)), at_minute(0));

        assert!(aggregate.snapshot(at_minute(1), true, 5, 10).is_live);
        assert!(!aggregate.snapshot(at_minute(1), false, 5, 10).is_live);
        assert!(!aggregate.snapshot(at_minute(30), true, 5, 10).is_live);
    }

    #[test]
    fn test_idle_detection() {
        let mut aggregate = ContentAggregate::new("p1", &config(), at_minute(0));
        aggregate.apply(&view("medium", at_minute(0)), at_minute(0));

        assert!(!aggregate.is_idle(at_minute(60), Duration::hours(24)));
        assert!(aggregate.is_idle(at_minute(24 * 60), Duration::hours(24)));
    }
}
