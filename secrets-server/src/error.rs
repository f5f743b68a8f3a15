// secrets-server/src/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use common::models::ErrorResponse;
use common::AppError;
use thiserror::Error;

/// Handler errors; clients only ever see a generic message plus the status
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("missing or invalid export credentials")]
    Unauthorized,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::App(AppError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::App(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            ApiError::App(AppError::InvalidInput(message)) => message.clone(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::App(_) => "Internal server error".to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { error })
    }
}
