/// Engagement Event Validator
///
/// First stop on the ingestion path: sanitizes incoming events and
/// deduplicates them by `event_id`. Upstream connectors deliver
/// at-least-once, so duplicates are expected operation, not an error:
/// a duplicate is admitted idempotently and performs no state change.
///
/// The dedup cache is in-memory with TTL-based cleanup:
/// - O(1) duplicate detection (DashMap lookup)
/// - TTL equal to the bucket retention window, so any event old enough to
///   have left the cache would land in an already-pruned bucket anyway
/// - Thread-safe, shared across ingestion workers
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use event_schema::EngagementEvent;
use tracing::{debug, info};
use uuid::Uuid;

use crate::metrics::DEDUP_ENTRIES;

/// Outcome of admission for a structurally valid event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First sighting; the event should be applied
    Accepted,
    /// Re-delivery of an already-applied event; no state change
    Duplicate,
}

#[derive(Debug, Clone, Copy)]
struct DedupEntry {
    seen_at: DateTime<Utc>,
}

impl DedupEntry {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.seen_at > ttl
    }
}

pub struct EventValidator {
    seen: DashMap<Uuid, DedupEntry>,
    ttl: Duration,
    clock_skew: Duration,
}

impl EventValidator {
    pub fn new(ttl_minutes: u64, clock_skew_seconds: u64) -> Self {
        Self {
            seen: DashMap::new(),
            ttl: Duration::minutes(ttl_minutes as i64),
            clock_skew: Duration::seconds(clock_skew_seconds as i64),
        }
    }

    /// Validate and deduplicate one event.
    ///
    /// Returns `Err(reason)` for events that must be dropped (malformed or
    /// outside the accepted time range) and `Ok(Admission)` otherwise.
    pub fn accept(
        &self,
        event: &EngagementEvent,
        now: DateTime<Utc>,
    ) -> Result<Admission, String> {
        if event.content_id.trim().is_empty() {
            return Err("content_id is empty".to_string());
        }

        if event.platform.trim().is_empty() {
            return Err("platform is empty".to_string());
        }

        if event.occurred_at > now + self.clock_skew {
            return Err(format!(
                "timestamp {} is beyond the clock-skew tolerance",
                event.occurred_at
            ));
        }

        if event.occurred_at < now - self.ttl {
            return Err(format!(
                "timestamp {} is older than the retention window",
                event.occurred_at
            ));
        }

        if let Some(entry) = self.seen.get(&event.event_id) {
            if entry.is_expired(now, self.ttl) {
                drop(entry); // release the shard read lock before removal
                self.seen.remove(&event.event_id);
            } else {
                debug!(event_id = %event.event_id, "Duplicate event - idempotent no-op");
                return Ok(Admission::Duplicate);
            }
        }

        self.seen.insert(event.event_id, DedupEntry { seen_at: now });
        Ok(Admission::Accepted)
    }

    /// Remove expired dedup entries.
    ///
    /// Called periodically from a background task to keep the cache bounded.
    pub fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.seen.len();
        self.seen.retain(|_, entry| !entry.is_expired(now, self.ttl));
        let removed = before - self.seen.len();

        DEDUP_ENTRIES.set(self.seen.len() as f64);

        if removed > 0 {
            info!(
                removed = removed,
                remaining = self.seen.len(),
                "Cleaned up expired dedup entries"
            );
        }
        removed
    }

    /// Current number of tracked event ids (for monitoring)
    pub fn size(&self) -> usize {
        self.seen.len()
    }
}
