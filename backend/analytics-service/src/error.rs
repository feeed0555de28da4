use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Backwards compatibility alias
pub type AppError = AnalyticsError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for AnalyticsError {
    fn error_response(&self) -> HttpResponse {
        let (code, message) = match self {
            AnalyticsError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AnalyticsError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AnalyticsError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AnalyticsError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        HttpResponse::build(code).json(ErrorResponse {
            error: message,
            code: code.as_u16(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AnalyticsError::NotFound(_) => StatusCode::NOT_FOUND,
            AnalyticsError::Validation(_) | AnalyticsError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AnalyticsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::BadRequest(err.to_string())
    }
}
