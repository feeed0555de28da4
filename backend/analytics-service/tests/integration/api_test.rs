//! HTTP surface tests driving the actix app end to end.

use actix_web::{test, web, App};
use chrono::Utc;
use event_schema::{EngagementEvent, EngagementKind};
use uuid::Uuid;

use analytics_service::app_state::AppState;
use analytics_service::config::Config;
use analytics_service::routes;

async fn spawn_app() -> (
    impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    AppState,
) {
    let state = AppState::initialize(Config::default());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure_routes),
    )
    .await;
    (app, state)
}

#[actix_web::test]
async fn test_health_endpoints() {
    let (app, _state) = spawn_app().await;

    for path in ["/api/v1/health", "/api/v1/health/live", "/api/v1/health/ready"] {
        let request = test::TestRequest::get().uri(path).to_request();
        let response = test::call_service(&app, request).await;
        assert!(response.status().is_success(), "{} failed", path);
    }
}

#[actix_web::test]
async fn test_ingest_roundtrip() {
    let (app, _state) = spawn_app().await;

    let event = EngagementEvent::new("p1", "medium", EngagementKind::View, Utc::now());
    let request = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(&event)
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(body["accepted"], true);

    let request = test::TestRequest::get()
        .uri("/api/v1/analytics/p1")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(body["analytics"]["total_views"], 1);
    assert_eq!(body["analytics"]["engagement_rate"], 0.0);
}

#[actix_web::test]
async fn test_rejected_event_reports_reason_in_body() {
    let (app, _state) = spawn_app().await;

    let mut event = EngagementEvent::new("p1", "medium", EngagementKind::View, Utc::now());
    event.content_id = String::new();

    let request = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(&event)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert!(response.status().is_success());

    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body["accepted"], false);
    assert!(body["reason"].as_str().is_some());
}

#[actix_web::test]
async fn test_batch_ingest_reports_per_item_outcomes() {
    let (app, _state) = spawn_app().await;

    let now = Utc::now();
    let good = EngagementEvent::new("p1", "medium", EngagementKind::View, now);
    let mut bad = EngagementEvent::new("p1", "medium", EngagementKind::Like, now);
    bad.platform = String::new();

    let request = test::TestRequest::post()
        .uri("/api/v1/events/batch")
        .set_json(serde_json::json!({ "events": [good, bad] }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body["accepted"], 1);
    assert_eq!(body["rejected"], 1);
    assert_eq!(body["results"][0]["accepted"], true);
    assert_eq!(body["results"][1]["accepted"], false);
}

#[actix_web::test]
async fn test_empty_batch_is_a_bad_request() {
    let (app, _state) = spawn_app().await;

    let request = test::TestRequest::post()
        .uri("/api/v1/events/batch")
        .set_json(serde_json::json!({ "events": [] }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), 400);
}

#[actix_web::test]
async fn test_unknown_content_is_404() {
    let (app, _state) = spawn_app().await;

    let request = test::TestRequest::get()
        .uri("/api/v1/analytics/nope")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), 404);
}

#[actix_web::test]
async fn test_unknown_alert_acknowledge_is_404() {
    let (app, _state) = spawn_app().await;

    let request = test::TestRequest::post()
        .uri(&format!("/api/v1/alerts/{}/acknowledge", Uuid::new_v4()))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), 404);
}

#[actix_web::test]
async fn test_subscription_lifecycle_drives_overview() {
    let (app, state) = spawn_app().await;

    // Subscribe p1 and feed it one event
    let request = test::TestRequest::post()
        .uri("/api/v1/subscriptions")
        .set_json(serde_json::json!({
            "content_id": "p1",
            "subscriber_ref": "dash-1"
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(body["scheduling_changed"], true);

    let event = EngagementEvent::new("p1", "medium", EngagementKind::View, Utc::now());
    state.engine.ingest(&event).await;

    let request = test::TestRequest::get()
        .uri("/api/v1/analytics/overview")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["content_id"], "p1");
    assert_eq!(body["items"][0]["is_live"], true);

    // Unsubscribe empties the overview but keeps the state queryable
    let request = test::TestRequest::delete()
        .uri("/api/v1/subscriptions")
        .set_json(serde_json::json!({
            "content_id": "p1",
            "subscriber_ref": "dash-1"
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(body["scheduling_changed"], true);

    let request = test::TestRequest::get()
        .uri("/api/v1/analytics/overview")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(body["count"], 0);

    let request = test::TestRequest::get()
        .uri("/api/v1/analytics/p1")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert!(response.status().is_success());
}

#[actix_web::test]
async fn test_metrics_exposition() {
    let (app, state) = spawn_app().await;

    let event = EngagementEvent::new("p1", "medium", EngagementKind::View, Utc::now());
    state.engine.ingest(&event).await;

    let request = test::TestRequest::get().uri("/metrics").to_request();
    let response = test::call_service(&app, request).await;
    assert!(response.status().is_success());

    let body = test::read_body(response).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("engagement_events_ingested_total"));
}
