use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use analytics_service::app_state::AppState;
use analytics_service::{background, routes, Config};

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,analytics_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting analytics-service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env();
    config
        .trend
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid trend configuration")?;

    tracing::info!("Environment: {}", config.app.env);
    tracing::info!(
        "Engine config: bucket_width={}s retention={}m realtime_window={}m tick={}s",
        config.engine.bucket_width_seconds,
        config.engine.retention_minutes,
        config.engine.realtime_window_minutes,
        config.engine.tick_interval_seconds,
    );

    // Wire application state and start the scheduler heartbeat
    let state = AppState::initialize(config.clone());
    let tasks = background::spawn_background_tasks(state.clone());

    let bind_addr = (config.app.host.clone(), config.app.port);
    tracing::info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure_routes)
    })
    .bind(bind_addr)
    .context("Failed to bind HTTP listener")?
    .run()
    .await
    .context("HTTP server terminated abnormally")?;

    background::shutdown_background_tasks(tasks).await;
    tracing::info!("analytics-service stopped");

    Ok(())
}
