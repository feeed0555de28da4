/// Ingestion API Handlers
///
/// HTTP entry points for engagement events. Outcomes are reported per
/// event so upstream connectors can decide what to retry; a rejected event
/// is a normal response, not an HTTP error.
use actix_web::{web, HttpResponse};
use event_schema::{EngagementBatch, EngagementEvent};
use serde::Serialize;

use crate::app_state::AppState;
use crate::error::{AppError, Result};
use crate::services::IngestOutcome;

#[derive(Debug, Serialize)]
pub struct BatchIngestResponse {
    pub accepted: usize,
    pub rejected: usize,
    pub results: Vec<IngestOutcome>,
}

/// POST /api/v1/events
///
/// Ingest a single engagement event.
///
/// Response:
/// ```json
/// {"accepted": true}
/// {"accepted": false, "reason": "content_id is empty"}
/// ```
pub async fn ingest_event(
    payload: web::Json<EngagementEvent>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let outcome = state.engine.ingest(&payload).await;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/v1/events/batch
///
/// Ingest a batch of events. Each event is validated and applied
/// independently; the response carries one outcome per input in order.
pub async fn ingest_batch(
    payload: web::Json<EngagementBatch>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if payload.events.is_empty() {
        return Err(AppError::BadRequest("events array cannot be empty".into()));
    }

    let results = state.engine.ingest_batch(&payload.events).await;
    let accepted = results.iter().filter(|outcome| outcome.accepted).count();

    Ok(HttpResponse::Ok().json(BatchIngestResponse {
        accepted,
        rejected: results.len() - accepted,
        results,
    }))
}
