use chrono::{DateTime, Utc};
/// Event Schema Registry for engagement telemetry across Pulse services
///
/// This library defines the versioned engagement-event schema shared by the
/// platform connectors that emit events and the analytics service that
/// consumes them. Each envelope carries a required `schema_version` field so
/// producers and consumers can detect payload incompatibilities as they
/// evolve independently.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for all events
pub const SCHEMA_VERSION: u32 = 1;

/// Base event envelope for all ingested payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique event ID for idempotency and tracing
    pub event_id: Uuid,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Schema version for compatibility checking
    pub schema_version: u32,
    /// Source connector that generated the event
    pub source: String,
    /// Correlation ID for distributed tracing
    pub correlation_id: Option<Uuid>,
    /// Actual event payload
    pub data: T,
}

impl<T> EventEnvelope<T> {
    pub fn new(source: impl Into<String>, data: T) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            schema_version: SCHEMA_VERSION,
            source: source.into(),
            correlation_id: None,
            data,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

// ============================================================================
// ENGAGEMENT EVENTS
// ============================================================================

/// Kind of engagement a reader performed on a piece of content.
///
/// Closed set so every consumer match is exhaustively checked; connectors
/// that report other interaction types must map them before publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    View,
    Like,
    Comment,
    Share,
}

impl EngagementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementKind::View => "view",
            EngagementKind::Like => "like",
            EngagementKind::Comment => "comment",
            EngagementKind::Share => "share",
        }
    }
}

impl std::fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single engagement event for one content item on one distribution
/// platform.
///
/// `event_id` is globally unique per source and is the idempotency key for
/// deduplication; the event is immutable once accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementEvent {
    /// Idempotency key, unique per source
    pub event_id: Uuid,
    /// Content item the engagement belongs to
    pub content_id: String,
    /// Distribution platform the engagement was observed on
    /// (e.g. "medium", "linkedin", "devto")
    pub platform: String,
    /// What the reader did
    pub kind: EngagementKind,
    /// When the engagement occurred at the source
    pub occurred_at: DateTime<Utc>,
}

impl EngagementEvent {
    pub fn new(
        content_id: impl Into<String>,
        platform: impl Into<String>,
        kind: EngagementKind,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            content_id: content_id.into(),
            platform: platform.into(),
            kind,
            occurred_at,
        }
    }
}

/// Batch submission of engagement events.
///
/// Events in a batch are independent of each other; consumers report a
/// per-event outcome and never fail the batch as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementBatch {
    pub events: Vec<EngagementEvent>,
}
