// secrets-server/src/api/mod.rs
pub mod secrets;
pub mod tokens;

use actix_web::web;
use common::AppError;
use crate::error::ApiError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(tokens::store_token)
        .service(secrets::get_secrets);
}

/// Malformed JSON bodies are reported like any other invalid input
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!("Rejected request body: {}", err);
        ApiError::from(AppError::invalid_input("Invalid request body")).into()
    })
}
