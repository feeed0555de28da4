/// Subscription API Handlers
///
/// Dashboards subscribe to the content they display; an item is evaluated
/// periodically while at least one subscription references it.
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub content_id: String,
    pub subscriber_ref: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub content_id: String,
    /// Whether this request changed the item's scheduling state
    pub scheduling_changed: bool,
}

fn validate(request: &SubscriptionRequest) -> Result<()> {
    if request.content_id.trim().is_empty() {
        return Err(AppError::BadRequest("content_id cannot be empty".into()));
    }
    if request.subscriber_ref.trim().is_empty() {
        return Err(AppError::BadRequest("subscriber_ref cannot be empty".into()));
    }
    Ok(())
}

/// POST /api/v1/subscriptions
pub async fn subscribe(
    payload: web::Json<SubscriptionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    validate(&payload)?;

    let scheduled = state
        .engine
        .subscribe(&payload.content_id, &payload.subscriber_ref);

    Ok(HttpResponse::Ok().json(SubscriptionResponse {
        content_id: payload.content_id.clone(),
        scheduling_changed: scheduled,
    }))
}

/// DELETE /api/v1/subscriptions
pub async fn unsubscribe(
    payload: web::Json<SubscriptionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    validate(&payload)?;

    let unscheduled = state
        .engine
        .unsubscribe(&payload.content_id, &payload.subscriber_ref);

    Ok(HttpResponse::Ok().json(SubscriptionResponse {
        content_id: payload.content_id.clone(),
        scheduling_changed: unscheduled,
    }))
}
