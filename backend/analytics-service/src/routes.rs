//! Route configuration
//!
//! Centralized route setup; handlers stay thin and all paths are visible in
//! one place.

use actix_web::{web, HttpResponse};

use crate::handlers;

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Prometheus exposition
        .route("/metrics", web::get().to(metrics_handler))
        // API routes
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(handlers::health_check))
                .route("/health/live", web::get().to(handlers::liveness_check))
                .route("/health/ready", web::get().to(handlers::readiness_check))
                // Ingestion
                .route("/events", web::post().to(handlers::ingest_event))
                .route("/events/batch", web::post().to(handlers::ingest_batch))
                // Queries (trending before the {content_id} catch-all)
                .route("/analytics/overview", web::get().to(handlers::overview))
                .route("/analytics/trending", web::get().to(handlers::trending))
                .route(
                    "/analytics/{content_id}",
                    web::get().to(handlers::content_analytics),
                )
                // Alerts
                .route("/alerts", web::get().to(handlers::list_alerts))
                .route(
                    "/alerts/{alert_id}/acknowledge",
                    web::post().to(handlers::acknowledge_alert),
                )
                // Subscriptions
                .route("/subscriptions", web::post().to(handlers::subscribe))
                .route("/subscriptions", web::delete().to(handlers::unsubscribe)),
        );
}

/// Metrics handler
async fn metrics_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(crate::metrics::gather_metrics())
}
