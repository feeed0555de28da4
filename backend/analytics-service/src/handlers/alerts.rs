/// Alert API Handlers
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::Result;
use crate::models::Alert;

/// Query parameters for GET /alerts
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    #[serde(default)]
    pub unacknowledged_only: bool,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub items: Vec<Alert>,
    pub count: usize,
}

/// GET /api/v1/alerts
///
/// All alerts, newest first; `?unacknowledged_only=true` filters to open
/// ones.
pub async fn list_alerts(
    query: web::Query<AlertsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let items = state.engine.alerts(query.unacknowledged_only);
    let count = items.len();

    Ok(HttpResponse::Ok().json(AlertsResponse { items, count }))
}

/// POST /api/v1/alerts/{alert_id}/acknowledge
///
/// Returns 404 for an unknown alert id.
pub async fn acknowledge_alert(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let alert_id = path.into_inner();
    state.engine.acknowledge_alert(alert_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "acknowledged": true })))
}
