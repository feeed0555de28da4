/// Analytics Query API Handlers
///
/// Read-only dashboard endpoints over the engine's in-memory state.
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_state::AppState;
use crate::error::Result;
use crate::models::{LiveAnalytics, TrendSnapshot};

/// Query parameters for GET /analytics/{content_id}
#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    /// Velocity window in minutes (default: the realtime window)
    pub window_minutes: Option<u64>,
}

/// Query parameters for GET /analytics/trending
#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    /// Limit (default: 10, max: 100)
    #[serde(default = "default_trending_limit")]
    pub limit: usize,
}

fn default_trending_limit() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub items: Vec<LiveAnalytics>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub items: Vec<TrendSnapshot>,
    pub count: usize,
}

/// GET /api/v1/analytics/overview
///
/// Live analytics for every actively monitored content item.
pub async fn overview(state: web::Data<AppState>) -> Result<HttpResponse> {
    let items = state.engine.overview().await;
    let count = items.len();

    Ok(HttpResponse::Ok().json(OverviewResponse { items, count }))
}

/// GET /api/v1/analytics/{content_id}
///
/// Combined live analytics, trend estimate and velocity for one item.
///
/// Query parameters:
/// - window_minutes: velocity window (default: realtime window)
pub async fn content_analytics(
    path: web::Path<String>,
    query: web::Query<AnalyticsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let content_id = path.into_inner();
    let window_minutes = query
        .window_minutes
        .unwrap_or(state.config.engine.realtime_window_minutes)
        .clamp(1, state.config.engine.retention_minutes);

    debug!(
        content_id = %content_id,
        window_minutes = window_minutes,
        "Analytics detail request"
    );

    let analytics = state.engine.analytics(&content_id, window_minutes).await?;
    Ok(HttpResponse::Ok().json(analytics))
}

/// GET /api/v1/analytics/trending
///
/// Top monitored items ranked by trend score (confidence breaks ties).
pub async fn trending(
    query: web::Query<TrendingQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let limit = query.limit.clamp(1, 100);
    let items = state.engine.trending(limit).await;
    let count = items.len();

    Ok(HttpResponse::Ok().json(TrendingResponse { items, count }))
}
