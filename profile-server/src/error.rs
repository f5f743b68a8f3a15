// profile-server/src/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use common::models::ErrorResponse;
use common::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::App(AppError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::App(AppError::UpstreamFailure(_)) => StatusCode::BAD_GATEWAY,
            ApiError::App(AppError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::App(AppError::Cancelled) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            ApiError::App(AppError::InvalidInput(message)) => message.clone(),
            ApiError::App(AppError::UpstreamFailure(_)) => "Upstream request failed".to_string(),
            ApiError::App(AppError::Unavailable(message)) => message.clone(),
            ApiError::App(AppError::Cancelled) => "Request superseded".to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { error })
    }
}
