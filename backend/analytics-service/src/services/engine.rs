/// Monitoring Engine
///
/// Owns all in-memory working state and wires the pipeline together:
/// validator -> per-content aggregate -> trend detector -> alert rules.
///
/// Concurrency model ("single writer per key"): every content item's
/// aggregate, rule states and latest trend live behind one `tokio::Mutex`,
/// and both event application and tick evaluation go through that lock, so
/// per-item state never sees concurrent writers and snapshot readers never
/// observe a torn bucket update. No lock spans more than one content item,
/// so ingestion for different items proceeds fully in parallel.
///
/// Mutating entry points take an explicit `now` so behavior is fully
/// deterministic under test; the public wrappers pass `Utc::now()`.
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use event_schema::EngagementEvent;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AnalyticsError, Result};
use crate::metrics::{
    ALERTS_EMITTED, EVALUATIONS, EVALUATION_TICK_SECONDS, EVENTS_INGESTED, LIVE_CONTENT,
    TRACKED_CONTENT,
};
use crate::models::{Alert, LiveAnalytics, TrendSnapshot, VelocityMetrics};
use crate::services::aggregator::ContentAggregate;
use crate::services::alerts::{self, RuleStates};
use crate::services::validator::{Admission, EventValidator};
use crate::services::{trend, velocity};

/// Per-item synchronous outcome of an ingestion attempt
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl IngestOutcome {
    fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }
}

/// Combined read model for one content item
#[derive(Debug, Clone, Serialize)]
pub struct ContentAnalytics {
    pub analytics: LiveAnalytics,
    pub trend: TrendSnapshot,
    pub velocity: VelocityMetrics,
}

struct ContentEntry {
    aggregate: ContentAggregate,
    rules: RuleStates,
    latest_trend: Option<TrendSnapshot>,
}

pub struct MonitorEngine {
    config: Config,
    entries: DashMap<String, Arc<Mutex<ContentEntry>>>,
    /// content_id -> subscriber ref -> subscribed-at; an item is scheduled
    /// while non-empty
    subscriptions: DashMap<String, HashMap<String, DateTime<Utc>>>,
    alerts: DashMap<Uuid, Alert>,
    validator: EventValidator,
}

impl MonitorEngine {
    pub fn new(config: Config) -> Self {
        let validator = EventValidator::new(
            config.engine.retention_minutes,
            config.engine.clock_skew_seconds,
        );

        Self {
            config,
            entries: DashMap::new(),
            subscriptions: DashMap::new(),
            alerts: DashMap::new(),
            validator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validator(&self) -> &EventValidator {
        &self.validator
    }

    /// Fetch or lazily create the entry for a content id
    fn entry(&self, content_id: &str, now: DateTime<Utc>) -> Arc<Mutex<ContentEntry>> {
        let entry = self
            .entries
            .entry(content_id.to_string())
            .or_insert_with(|| {
                debug!(content_id = %content_id, "Creating aggregation state");
                Arc::new(Mutex::new(ContentEntry {
                    aggregate: ContentAggregate::new(content_id, &self.config.engine, now),
                    rules: RuleStates::default(),
                    latest_trend: None,
                }))
            })
            .clone();
        TRACKED_CONTENT.set(self.entries.len() as f64);
        entry
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    pub async fn ingest(&self, event: &EngagementEvent) -> IngestOutcome {
        self.ingest_at(event, Utc::now()).await
    }

    pub async fn ingest_at(&self, event: &EngagementEvent, now: DateTime<Utc>) -> IngestOutcome {
        match self.validator.accept(event, now) {
            Err(reason) => {
                EVENTS_INGESTED.with_label_values(&["rejected"]).inc();
                debug!(
                    event_id = %event.event_id,
                    content_id = %event.content_id,
                    reason = %reason,
                    "Rejected engagement event"
                );
                IngestOutcome::rejected(reason)
            }
            Ok(Admission::Duplicate) => {
                // Idempotent no-op: re-delivery from upstream is always safe
                EVENTS_INGESTED.with_label_values(&["duplicate"]).inc();
                IngestOutcome::accepted()
            }
            Ok(Admission::Accepted) => {
                let entry = self.entry(&event.content_id, now);
                let mut guard = entry.lock().await;
                guard.aggregate.apply(event, now);
                drop(guard);

                EVENTS_INGESTED.with_label_values(&["accepted"]).inc();
                IngestOutcome::accepted()
            }
        }
    }

    /// Apply a batch event by event; items are independent and one
    /// rejection never affects the others.
    pub async fn ingest_batch_at(
        &self,
        events: &[EngagementEvent],
        now: DateTime<Utc>,
    ) -> Vec<IngestOutcome> {
        let mut results = Vec::with_capacity(events.len());
        for event in events {
            results.push(self.ingest_at(event, now).await);
        }
        results
    }

    pub async fn ingest_batch(&self, events: &[EngagementEvent]) -> Vec<IngestOutcome> {
        self.ingest_batch_at(events, Utc::now()).await
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a subscriber; returns true when the item transitioned from
    /// unscheduled to scheduled (0 -> 1 subscribers).
    pub fn subscribe_at(
        &self,
        content_id: &str,
        subscriber_ref: &str,
        now: DateTime<Utc>,
    ) -> bool {
        // State is created lazily on first subscription as well as on first
        // event
        self.entry(content_id, now);

        let mut subscribers = self.subscriptions.entry(content_id.to_string()).or_default();
        let was_empty = subscribers.is_empty();
        // Re-subscribing keeps the original subscription time
        subscribers.entry(subscriber_ref.to_string()).or_insert(now);
        drop(subscribers);

        if was_empty {
            info!(content_id = %content_id, "Content scheduled for periodic evaluation");
        }
        LIVE_CONTENT.set(self.subscribed_ids().len() as f64);
        was_empty
    }

    pub fn subscribe(&self, content_id: &str, subscriber_ref: &str) -> bool {
        self.subscribe_at(content_id, subscriber_ref, Utc::now())
    }

    /// Drop a subscriber; returns true when the item left the evaluation
    /// schedule (1 -> 0 subscribers). Safe to call at any time: in-flight
    /// evaluations complete, the item just stops being scheduled, and its
    /// state stays resident until idle eviction.
    pub fn unsubscribe(&self, content_id: &str, subscriber_ref: &str) -> bool {
        let now_unscheduled = match self.subscriptions.get_mut(content_id) {
            Some(mut subscribers) => {
                subscribers.remove(subscriber_ref);
                subscribers.is_empty()
            }
            None => return false,
        };

        if now_unscheduled {
            self.subscriptions.remove(content_id);
            info!(content_id = %content_id, "Content unscheduled");
        }
        LIVE_CONTENT.set(self.subscribed_ids().len() as f64);
        now_unscheduled
    }

    pub fn is_subscribed(&self, content_id: &str) -> bool {
        self.subscriptions
            .get(content_id)
            .map(|subscribers| !subscribers.is_empty())
            .unwrap_or(false)
    }

    fn subscribed_ids(&self) -> Vec<String> {
        self.subscriptions
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    // ========================================================================
    // Periodic evaluation
    // ========================================================================

    /// Evaluate every scheduled item. Items are isolated from each other:
    /// each evaluation runs under its own timeout and a slow item is
    /// skipped (and retried next tick) without delaying the rest.
    pub async fn evaluate_all_at(&self, now: DateTime<Utc>) -> usize {
        let ids = self.subscribed_ids();
        if ids.is_empty() {
            return 0;
        }

        let timer = EVALUATION_TICK_SECONDS.start_timer();
        let budget = std::time::Duration::from_millis(self.config.engine.evaluation_timeout_ms);

        let evaluations = ids.into_iter().map(|content_id| async move {
            match tokio::time::timeout(budget, self.evaluate_one(&content_id, now)).await {
                Ok(new_alerts) => {
                    EVALUATIONS.with_label_values(&["ok"]).inc();
                    new_alerts
                }
                Err(_) => {
                    EVALUATIONS.with_label_values(&["timeout"]).inc();
                    warn!(
                        content_id = %content_id,
                        budget_ms = self.config.engine.evaluation_timeout_ms,
                        "Evaluation exceeded its budget; skipped until next tick"
                    );
                    0
                }
            }
        });

        let raised: usize = futures::future::join_all(evaluations).await.iter().sum();
        timer.observe_duration();

        TRACKED_CONTENT.set(self.entries.len() as f64);
        raised
    }

    pub async fn evaluate_all(&self) -> usize {
        self.evaluate_all_at(Utc::now()).await
    }

    async fn evaluate_one(&self, content_id: &str, now: DateTime<Utc>) -> usize {
        let Some(entry) = self.entries.get(content_id).map(|e| e.value().clone()) else {
            return 0;
        };

        let mut guard = entry.lock().await;
        let ContentEntry {
            aggregate,
            rules,
            latest_trend,
        } = &mut *guard;

        // Eager prune on the tick; apply() also prunes lazily
        aggregate.prune(now);

        let snapshot = trend::detect(aggregate, &self.config.trend, now);
        let new_alerts = alerts::evaluate(
            aggregate,
            &snapshot,
            rules,
            &self.config.alerts,
            self.config.trend.window_minutes,
            now,
        );
        *latest_trend = Some(snapshot);
        drop(guard);

        let raised = new_alerts.len();
        for alert in new_alerts {
            ALERTS_EMITTED
                .with_label_values(&[alert.alert_type.as_str()])
                .inc();
            info!(
                content_id = %alert.content_id,
                alert_type = %alert.alert_type,
                severity = ?alert.severity,
                "Alert raised: {}",
                alert.message
            );
            self.alerts.insert(alert.id, alert);
        }
        raised
    }

    /// Evict items with no subscribers and no recent events. State is only
    /// dropped from memory; durable history lives with the external store.
    pub async fn evict_idle_at(&self, now: DateTime<Utc>) -> usize {
        let idle = Duration::hours(self.config.engine.idle_eviction_hours as i64);

        let candidates: Vec<(String, Arc<Mutex<ContentEntry>>)> = self
            .entries
            .iter()
            .filter(|entry| !self.is_subscribed(entry.key()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut evicted = 0;
        for (content_id, entry) in candidates {
            // A busy entry is never idle; skip and revisit next sweep
            let Ok(guard) = entry.try_lock() else { continue };
            if guard.aggregate.is_idle(now, idle) {
                drop(guard);
                self.entries.remove(&content_id);
                evicted += 1;
                debug!(content_id = %content_id, "Evicted idle aggregation state");
            }
        }

        if evicted > 0 {
            info!(evicted = evicted, remaining = self.entries.len(), "Idle eviction sweep");
        }
        TRACKED_CONTENT.set(self.entries.len() as f64);
        evicted
    }

    pub fn tracked_content(&self) -> usize {
        self.entries.len()
    }

    // ========================================================================
    // Query facade (read-only except alert acknowledgement)
    // ========================================================================

    /// Current analytics for every actively scheduled item
    pub async fn overview_at(&self, now: DateTime<Utc>) -> Vec<LiveAnalytics> {
        let mut result = Vec::new();
        for content_id in self.subscribed_ids() {
            let Some(entry) = self.entries.get(&content_id).map(|e| e.value().clone()) else {
                continue;
            };
            let guard = entry.lock().await;
            result.push(guard.aggregate.snapshot(
                now,
                true,
                self.config.engine.realtime_window_minutes,
                self.config.engine.freshness_minutes,
            ));
        }
        result.sort_by(|a, b| a.content_id.cmp(&b.content_id));
        result
    }

    pub async fn overview(&self) -> Vec<LiveAnalytics> {
        self.overview_at(Utc::now()).await
    }

    /// Analytics, trend and velocity for one item over the requested window
    pub async fn analytics_at(
        &self,
        content_id: &str,
        window_minutes: u64,
        now: DateTime<Utc>,
    ) -> Result<ContentAnalytics> {
        let Some(entry) = self.entries.get(content_id).map(|e| e.value().clone()) else {
            return Err(AnalyticsError::NotFound(format!(
                "No analytics state for content {}",
                content_id
            )));
        };

        let guard = entry.lock().await;
        let analytics = guard.aggregate.snapshot(
            now,
            self.is_subscribed(content_id),
            self.config.engine.realtime_window_minutes,
            self.config.engine.freshness_minutes,
        );
        let trend = trend::detect(&guard.aggregate, &self.config.trend, now);
        let velocity = velocity::compute(&guard.aggregate, window_minutes, now);

        Ok(ContentAnalytics {
            analytics,
            trend,
            velocity,
        })
    }

    pub async fn analytics(&self, content_id: &str, window_minutes: u64) -> Result<ContentAnalytics> {
        self.analytics_at(content_id, window_minutes, Utc::now()).await
    }

    /// All alerts, newest first
    pub fn alerts(&self, unacknowledged_only: bool) -> Vec<Alert> {
        let mut result: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|entry| !unacknowledged_only || !entry.value().acknowledged)
            .map(|entry| entry.value().clone())
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Flip the acknowledged flag and return the rule to quiet so the
    /// condition can re-raise once the suppression window allows.
    pub async fn acknowledge_alert(&self, alert_id: Uuid) -> Result<()> {
        let (alert_type, content_id) = {
            let mut alert = self.alerts.get_mut(&alert_id).ok_or_else(|| {
                AnalyticsError::NotFound(format!("Alert {} does not exist", alert_id))
            })?;
            alert.acknowledged = true;
            (alert.alert_type, alert.content_id.clone())
        };

        if let Some(entry) = self.entries.get(&content_id).map(|e| e.value().clone()) {
            entry.lock().await.rules.acknowledge(alert_type, alert_id);
        }

        info!(alert_id = %alert_id, content_id = %content_id, "Alert acknowledged");
        Ok(())
    }

    /// Top scheduled items by trend score (confidence breaks ties), limited
    /// to those clearing the minimum display score
    pub async fn trending(&self, limit: usize) -> Vec<TrendSnapshot> {
        let mut snapshots = Vec::new();
        for content_id in self.subscribed_ids() {
            let Some(entry) = self.entries.get(&content_id).map(|e| e.value().clone()) else {
                continue;
            };
            let guard = entry.lock().await;
            if let Some(trend) = guard.latest_trend.clone() {
                if trend.trend_score >= self.config.trend.min_trending_score {
                    snapshots.push(trend);
                }
            }
        }

        snapshots.sort_by(|a, b| {
            b.trend_score
                .total_cmp(&a.trend_score)
                .then(b.confidence.total_cmp(&a.confidence))
        });
        snapshots.truncate(limit);
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use event_schema::EngagementKind;

    fn engine() -> MonitorEngine {
        MonitorEngine::new(Config::default())
    }

    fn at_minute(minute: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_699_999_980 + minute * 60, 0).unwrap()
    }

    fn view(content_id: &str, at: DateTime<Utc>) -> EngagementEvent {
        EngagementEvent::new(content_id, "medium", EngagementKind::View, at)
    }

    #[tokio::test]
    async fn test_ingest_creates_state_lazily() {
        let engine = engine();
        let now = at_minute(0);

        assert_eq!(engine.tracked_content(), 0);
        let outcome = engine.ingest_at(&view("p1", now), now).await;
        assert!(outcome.accepted);
        assert_eq!(engine.tracked_content(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_event_is_accepted_without_state_change() {
        let engine = engine();
        let now = at_minute(0);
        let event = view("p1", now);

        engine.ingest_at(&event, now).await;
        let replay = engine.ingest_at(&event, now).await;
        assert!(replay.accepted);
        assert!(replay.reason.is_none());

        let analytics = engine.analytics_at("p1", 5, now).await.unwrap();
        assert_eq!(analytics.analytics.total_views, 1);
    }

    #[tokio::test]
    async fn test_rejected_event_reports_reason() {
        let engine = engine();
        let now = at_minute(0);

        let mut event = view("p1", now);
        event.content_id = String::new();

        let outcome = engine.ingest_at(&event, now).await;
        assert!(!outcome.accepted);
        assert!(outcome.reason.is_some());
        assert_eq!(engine.tracked_content(), 0);
    }

    #[tokio::test]
    async fn test_subscription_refcounts_drive_scheduling() {
        let engine = engine();
        let now = at_minute(0);

        assert!(engine.subscribe_at("p1", "dash-1", now));
        assert!(!engine.subscribe_at("p1", "dash-2", now));
        assert!(engine.is_subscribed("p1"));

        assert!(!engine.unsubscribe("p1", "dash-1"));
        assert!(engine.unsubscribe("p1", "dash-2"));
        assert!(!engine.is_subscribed("p1"));

        // State survives unsubscription until idle eviction
        assert_eq!(engine.tracked_content(), 1);
    }

    #[tokio::test]
    async fn test_evict_idle_spares_subscribed_and_active_items() {
        let engine = engine();
        let start = at_minute(0);

        engine.ingest_at(&view("stale", start), start).await;
        engine.ingest_at(&view("active", start), start).await;
        engine.subscribe_at("watched", "dash-1", start);

        let day_later = at_minute(25 * 60);
        engine.ingest_at(&view("active", day_later), day_later).await;

        let evicted = engine.evict_idle_at(day_later).await;
        assert_eq!(evicted, 1);
        assert_eq!(engine.tracked_content(), 2);
        assert!(engine.analytics_at("stale", 5, day_later).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_content_analytics_is_not_found() {
        let engine = engine();
        let result = engine.analytics_at("missing", 5, at_minute(0)).await;
        assert!(matches!(result, Err(AnalyticsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_acknowledge_unknown_alert_is_not_found() {
        let engine = engine();
        let result = engine.acknowledge_alert(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AnalyticsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_overview_lists_only_scheduled_items() {
        let engine = engine();
        let now = at_minute(0);

        engine.ingest_at(&view("p1", now), now).await;
        engine.ingest_at(&view("p2", now), now).await;
        engine.subscribe_at("p1", "dash-1", now);

        let overview = engine.overview_at(now).await;
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].content_id, "p1");
    }
}
