use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    tracked_content: usize,
}

/// Basic health check
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tracked_content: state.engine.tracked_content(),
    })
}

/// Liveness probe: the process is up and serving
pub async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
}

/// Readiness probe. The engine holds only in-memory state, so readiness
/// follows liveness; the body carries counters for operators.
pub async fn readiness_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "ready": true,
        "tracked_content": state.engine.tracked_content(),
        "dedup_entries": state.engine.validator().size(),
    }))
}
