//! Background task management
//!
//! Centralizes spawning and shutdown of the long-running tasks that drive
//! the engine: the evaluation scheduler, dedup-cache cleanup and idle
//! eviction. The scheduler is the heartbeat of the system: it re-evaluates
//! every subscribed item even when no new events arrive, so time-based
//! decay, staleness and alert hysteresis keep moving.

use chrono::Utc;
use std::time::Duration;

use crate::app_state::AppState;

/// How often expired dedup-cache entries are swept
const DEDUP_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// How often idle content state is considered for eviction
const EVICTION_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Background task handles for graceful shutdown
pub struct BackgroundTasks {
    pub scheduler_handle: tokio::task::JoinHandle<()>,
    pub dedup_cleanup_handle: tokio::task::JoinHandle<()>,
    pub eviction_handle: tokio::task::JoinHandle<()>,
}

/// Spawn all background tasks
pub fn spawn_background_tasks(state: AppState) -> BackgroundTasks {
    tracing::info!("Spawning background tasks");

    let scheduler_handle = spawn_evaluation_scheduler(state.clone());
    let dedup_cleanup_handle = spawn_dedup_cleanup(state.clone());
    let eviction_handle = spawn_idle_eviction(state);

    BackgroundTasks {
        scheduler_handle,
        dedup_cleanup_handle,
        eviction_handle,
    }
}

/// Gracefully shutdown all background tasks
pub async fn shutdown_background_tasks(tasks: BackgroundTasks) {
    tracing::info!("Shutting down background tasks");

    for (name, handle) in [
        ("evaluation scheduler", tasks.scheduler_handle),
        ("dedup cleanup", tasks.dedup_cleanup_handle),
        ("idle eviction", tasks.eviction_handle),
    ] {
        handle.abort();
        match tokio::time::timeout(Duration::from_secs(5), handle).await {
            Ok(Ok(())) => tracing::info!("{} shut down gracefully", name),
            Ok(Err(_)) => tracing::info!("{} aborted", name),
            Err(_) => tracing::warn!("{} did not shut down within timeout", name),
        }
    }
}

fn spawn_evaluation_scheduler(state: AppState) -> tokio::task::JoinHandle<()> {
    let tick = Duration::from_secs(state.config.engine.tick_interval_seconds.max(1));

    tokio::spawn(async move {
        tracing::info!(interval_secs = tick.as_secs(), "Evaluation scheduler started");
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let raised = state.engine.evaluate_all().await;
            if raised > 0 {
                tracing::debug!(alerts = raised, "Evaluation tick raised alerts");
            }
        }
    })
}

fn spawn_dedup_cleanup(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DEDUP_CLEANUP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            state.engine.validator().cleanup_expired(Utc::now());
        }
    })
}

fn spawn_idle_eviction(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_SWEEP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            state.engine.evict_idle_at(Utc::now()).await;
        }
    })
}
