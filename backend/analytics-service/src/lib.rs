pub mod app_state;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AnalyticsError, AppError, Result};
