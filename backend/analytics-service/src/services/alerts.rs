/// Alert Engine
///
/// Evaluates alert rules over aggregate + trend state on every scheduler
/// tick. Each `(content_id, type)` pair runs a small state machine:
///
/// ```text
/// Quiet -> Raised -> Acknowledged -> Quiet   (re-raisable past suppression)
///            `-----------------------> Quiet (condition clears, hysteresis)
/// ```
///
/// A re-raise always requires the suppression window to have elapsed since
/// the last raise of that pair, whether or not the previous alert was
/// acknowledged in between, so the same condition holding across many ticks
/// yields exactly one unacknowledged alert. Milestones are tracked through a
/// high-water marker instead and fire exactly once per boundary.
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::AlertConfig;
use crate::models::{Alert, AlertSeverity, AlertType, TrendSnapshot};
use crate::services::aggregator::ContentAggregate;
use crate::services::velocity;

#[derive(Debug, Default)]
pub struct RuleStates {
    states: HashMap<AlertType, RuleState>,
}

#[derive(Debug, Default)]
struct RuleState {
    phase: Phase,
    last_raised_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Quiet,
    Raised {
        alert_id: Uuid,
        /// Set when the condition first went false while raised
        cleared_since: Option<DateTime<Utc>>,
    },
}

impl RuleStates {
    /// Advance one rule's state machine and report whether a new alert
    /// should be raised this tick.
    fn should_raise(
        &mut self,
        alert_type: AlertType,
        condition: bool,
        config: &AlertConfig,
        now: DateTime<Utc>,
    ) -> bool {
        let state = self.states.entry(alert_type).or_default();
        let suppression = Duration::minutes(config.suppression_minutes as i64);
        let hysteresis = Duration::minutes(config.clear_hysteresis_minutes as i64);

        let suppression_elapsed = state
            .last_raised_at
            .map(|at| now - at >= suppression)
            .unwrap_or(true);

        if condition {
            if let Phase::Raised { cleared_since, .. } = &mut state.phase {
                *cleared_since = None;
            }
            suppression_elapsed
        } else {
            let decayed = match &mut state.phase {
                Phase::Raised { cleared_since, .. } => match cleared_since {
                    None => {
                        *cleared_since = Some(now);
                        false
                    }
                    Some(since) => now - *since >= hysteresis,
                },
                Phase::Quiet => false,
            };
            if decayed {
                state.phase = Phase::Quiet;
            }
            false
        }
    }

    fn mark_raised(&mut self, alert_type: AlertType, alert_id: Uuid, now: DateTime<Utc>) {
        let state = self.states.entry(alert_type).or_default();
        state.phase = Phase::Raised {
            alert_id,
            cleared_since: None,
        };
        state.last_raised_at = Some(now);
    }

    /// Resolve an acknowledged alert back to quiet. Returns false when the
    /// id no longer matches the active raise (e.g. it was superseded).
    pub fn acknowledge(&mut self, alert_type: AlertType, alert_id: Uuid) -> bool {
        let Some(state) = self.states.get_mut(&alert_type) else {
            return false;
        };

        match state.phase {
            Phase::Raised { alert_id: active, .. } if active == alert_id => {
                state.phase = Phase::Quiet;
                true
            }
            _ => false,
        }
    }
}

/// Evaluate all rules for one content item. Returns newly raised alerts
/// only; suppression and hysteresis state advances as a side effect.
pub fn evaluate(
    aggregate: &mut ContentAggregate,
    trend: &TrendSnapshot,
    states: &mut RuleStates,
    config: &AlertConfig,
    window_minutes: u64,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let content_id = aggregate.content_id().to_string();
    let recent = aggregate.window_counts(now, window_minutes);
    let prior = aggregate.previous_window_counts(now, window_minutes);

    let mut raised = Vec::new();

    // viral_potential: high trend score while still accelerating
    let viral = trend.trend_score >= config.viral_trend_threshold && trend.acceleration > 0.0;
    if states.should_raise(AlertType::ViralPotential, viral, config, now) {
        let severity = if trend.trend_score >= config.viral_warning_threshold {
            AlertSeverity::Warning
        } else {
            AlertSeverity::Info
        };
        let alert = Alert::new(
            AlertType::ViralPotential,
            severity,
            &content_id,
            "Viral Potential Detected",
            format!(
                "{} is showing viral potential (trend score {:.0}, {} views in the recent window)",
                content_id, trend.trend_score, recent.views
            ),
            now,
        )
        .with_current_value(trend.trend_score);
        states.mark_raised(AlertType::ViralPotential, alert.id, now);
        raised.push(alert);
    }

    // engagement_spike: engagement rate jumped over its trailing baseline
    let recent_rate = recent.engagement_rate();
    let prior_rate = prior.engagement_rate();
    let spike =
        recent.views >= config.spike_min_views && recent_rate - prior_rate > config.spike_delta;
    if states.should_raise(AlertType::EngagementSpike, spike, config, now) {
        let alert = Alert::new(
            AlertType::EngagementSpike,
            AlertSeverity::Warning,
            &content_id,
            "Engagement Spike",
            format!(
                "Engagement rate on {} jumped from {:.1}% to {:.1}%",
                content_id,
                prior_rate * 100.0,
                recent_rate * 100.0
            ),
            now,
        )
        .with_current_value(recent_rate);
        states.mark_raised(AlertType::EngagementSpike, alert.id, now);
        raised.push(alert);
    }

    // performance_drop: view velocity fell below its trailing baseline
    let recent_velocity = velocity::rates_from_counts(&recent, window_minutes).views_per_minute;
    let prior_velocity = velocity::rates_from_counts(&prior, window_minutes).views_per_minute;
    let drop = prior_velocity >= config.drop_min_baseline
        && recent_velocity < prior_velocity * config.drop_warning_fraction;
    if states.should_raise(AlertType::PerformanceDrop, drop, config, now) {
        let severity = if recent_velocity < prior_velocity * config.drop_critical_fraction {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };
        let alert = Alert::new(
            AlertType::PerformanceDrop,
            severity,
            &content_id,
            "Performance Drop",
            format!(
                "View velocity on {} fell to {:.1}/min from {:.1}/min",
                content_id, recent_velocity, prior_velocity
            ),
            now,
        )
        .with_current_value(recent_velocity);
        states.mark_raised(AlertType::PerformanceDrop, alert.id, now);
        raised.push(alert);
    }

    // milestone_reached: one-time boundary crossings tracked by high-water
    // marker, outside the suppression machinery
    let total_views = aggregate.total_views();
    let mut crossed = Vec::new();
    for &boundary in &config.milestones {
        if total_views >= boundary && boundary > aggregate.highest_milestone() {
            crossed.push(boundary);
        }
    }
    for boundary in crossed {
        let alert = Alert::new(
            AlertType::MilestoneReached,
            AlertSeverity::Info,
            &content_id,
            "Milestone Reached",
            format!("{} crossed {} total views", content_id, boundary),
            now,
        )
        .with_current_value(boundary as f64);
        aggregate.record_milestone(boundary);
        raised.push(alert);
    }

    raised
}
