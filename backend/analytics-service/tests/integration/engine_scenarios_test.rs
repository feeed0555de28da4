//! End-to-end scenarios against the monitoring engine with fixed
//! timestamps, covering the observable contract: counters, windows, alert
//! dedup and milestone exactly-once behavior.

use chrono::{DateTime, TimeZone, Utc};
use event_schema::{EngagementEvent, EngagementKind};

use analytics_service::config::Config;
use analytics_service::models::AlertType;
use analytics_service::services::MonitorEngine;

/// Minute-aligned base so bucket boundaries are predictable
fn at_minute(minute: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_699_999_980 + minute * 60, 0).unwrap()
}

async fn ingest_many(
    engine: &MonitorEngine,
    content_id: &str,
    kind: EngagementKind,
    count: usize,
    minute: i64,
) {
    let at = at_minute(minute);
    for _ in 0..count {
        let event = EngagementEvent::new(content_id, "medium", kind, at);
        let outcome = engine.ingest_at(&event, at).await;
        assert!(outcome.accepted, "event should be accepted: {:?}", outcome.reason);
    }
}

fn unacknowledged_of_type(engine: &MonitorEngine, alert_type: AlertType) -> usize {
    engine
        .alerts(true)
        .iter()
        .filter(|alert| alert.alert_type == alert_type)
        .count()
}

/// Scenario A: steady views, no engagement.
#[tokio::test]
async fn scenario_a_steady_views_without_engagement() {
    let engine = MonitorEngine::new(Config::default());
    engine.subscribe_at("p1", "dashboard", at_minute(0));

    for minute in 0..5 {
        ingest_many(&engine, "p1", EngagementKind::View, 100, minute).await;
    }

    let now = at_minute(4);
    engine.evaluate_all_at(now).await;

    let detail = engine.analytics_at("p1", 5, now).await.unwrap();
    assert_eq!(detail.analytics.total_views, 500);
    assert_eq!(detail.analytics.realtime_views, 500);
    assert_eq!(detail.analytics.engagement_rate, 0.0);
    assert_eq!(detail.velocity.views_per_minute, 100.0);
    assert!(detail.analytics.is_live);

    assert_eq!(unacknowledged_of_type(&engine, AlertType::EngagementSpike), 0);
}

/// Scenario B: likes arrive while views hold flat; the spike alert raises
/// exactly once even across repeated ticks.
#[tokio::test]
async fn scenario_b_engagement_spike_raises_once() {
    let engine = MonitorEngine::new(Config::default());
    engine.subscribe_at("p1", "dashboard", at_minute(0));

    for minute in 0..5 {
        ingest_many(&engine, "p1", EngagementKind::View, 100, minute).await;
    }
    ingest_many(&engine, "p1", EngagementKind::View, 100, 5).await;
    ingest_many(&engine, "p1", EngagementKind::Like, 50, 5).await;

    // The condition stays true across several ticks inside the suppression
    // window; exactly one unacknowledged spike alert may exist
    for tick in 0..5 {
        engine.evaluate_all_at(at_minute(5) + chrono::Duration::seconds(tick * 5)).await;
    }

    let detail = engine.analytics_at("p1", 5, at_minute(5)).await.unwrap();
    assert!(detail.analytics.engagement_rate > 0.08);

    assert_eq!(unacknowledged_of_type(&engine, AlertType::EngagementSpike), 1);
    let spike = engine
        .alerts(true)
        .into_iter()
        .find(|alert| alert.alert_type == AlertType::EngagementSpike)
        .unwrap();
    assert_eq!(format!("{:?}", spike.severity), "Warning");
    assert_eq!(spike.content_id, "p1");
}

/// Scenario C: duplicate delivery is accepted but changes nothing.
#[tokio::test]
async fn scenario_c_duplicate_event_is_idempotent() {
    let engine = MonitorEngine::new(Config::default());
    let now = at_minute(0);

    let event = EngagementEvent::new("p1", "medium", EngagementKind::View, now);
    assert!(engine.ingest_at(&event, now).await.accepted);

    let before = engine.analytics_at("p1", 5, now).await.unwrap();

    let replay = engine.ingest_at(&event, now).await;
    assert!(replay.accepted);

    let after = engine.analytics_at("p1", 5, now).await.unwrap();
    assert_eq!(after.analytics.total_views, before.analytics.total_views);
    assert_eq!(after.analytics.realtime_views, before.analytics.realtime_views);
    assert_eq!(
        after.analytics.platform_breakdown["medium"],
        before.analytics.platform_breakdown["medium"]
    );
}

/// Scenario D: milestone boundaries fire exactly once each.
#[tokio::test]
async fn scenario_d_milestone_fires_once_per_boundary() {
    let engine = MonitorEngine::new(Config::default());
    engine.subscribe_at("p2", "dashboard", at_minute(0));

    ingest_many(&engine, "p2", EngagementKind::View, 1_000, 0).await;
    engine.evaluate_all_at(at_minute(0)).await;

    let milestones: Vec<_> = engine
        .alerts(false)
        .into_iter()
        .filter(|alert| alert.alert_type == AlertType::MilestoneReached)
        .collect();
    assert_eq!(milestones.len(), 1);
    assert_eq!(milestones[0].current_value, Some(1_000.0));

    // More views, still below the next boundary: re-evaluation stays quiet
    ingest_many(&engine, "p2", EngagementKind::View, 50, 1).await;
    engine.evaluate_all_at(at_minute(1)).await;
    engine.evaluate_all_at(at_minute(2)).await;

    let milestones = engine
        .alerts(false)
        .into_iter()
        .filter(|alert| alert.alert_type == AlertType::MilestoneReached)
        .count();
    assert_eq!(milestones, 1);
}

/// A hot item shows up in the trending ranking after evaluation.
#[tokio::test]
async fn trending_ranks_accelerating_content() {
    let engine = MonitorEngine::new(Config::default());
    engine.subscribe_at("hot", "dashboard", at_minute(0));
    engine.subscribe_at("cold", "dashboard", at_minute(0));

    for minute in 0..5 {
        ingest_many(&engine, "hot", EngagementKind::View, 200, minute).await;
        ingest_many(&engine, "cold", EngagementKind::View, 1, minute).await;
    }

    engine.evaluate_all_at(at_minute(4)).await;

    let trending = engine.trending(10).await;
    assert!(!trending.is_empty());
    assert_eq!(trending[0].content_id, "hot");
    assert!(trending[0].trend_score >= 50.0);
    assert!(trending.iter().all(|t| t.content_id != "cold"));
}

/// Acknowledging an alert keeps it out of the unacknowledged view and the
/// suppression window still gates the re-raise.
#[tokio::test]
async fn acknowledged_alerts_leave_the_open_list() {
    let engine = MonitorEngine::new(Config::default());
    engine.subscribe_at("p1", "dashboard", at_minute(0));

    for minute in 0..5 {
        ingest_many(&engine, "p1", EngagementKind::View, 100, minute).await;
    }
    ingest_many(&engine, "p1", EngagementKind::View, 100, 5).await;
    ingest_many(&engine, "p1", EngagementKind::Like, 50, 5).await;
    engine.evaluate_all_at(at_minute(5)).await;

    let open = engine.alerts(true);
    let spike = open
        .iter()
        .find(|alert| alert.alert_type == AlertType::EngagementSpike)
        .unwrap();

    engine.acknowledge_alert(spike.id).await.unwrap();
    assert_eq!(unacknowledged_of_type(&engine, AlertType::EngagementSpike), 0);

    // Same condition immediately afterwards: still suppressed
    engine.evaluate_all_at(at_minute(6)).await;
    assert_eq!(unacknowledged_of_type(&engine, AlertType::EngagementSpike), 0);
}

/// Cumulative counters never decrease as time advances and buckets expire.
#[tokio::test]
async fn totals_are_monotone_as_buckets_expire() {
    let engine = MonitorEngine::new(Config::default());
    engine.subscribe_at("p1", "dashboard", at_minute(0));

    ingest_many(&engine, "p1", EngagementKind::View, 100, 0).await;
    let early = engine.analytics_at("p1", 5, at_minute(1)).await.unwrap();

    // 90 minutes later the buckets are gone but totals remain
    ingest_many(&engine, "p1", EngagementKind::View, 10, 90).await;
    let late = engine.analytics_at("p1", 5, at_minute(90)).await.unwrap();

    assert!(late.analytics.total_views >= early.analytics.total_views);
    assert_eq!(late.analytics.total_views, 110);
    assert_eq!(late.analytics.realtime_views, 10);
}
