// secrets-server/src/api/tokens.rs
use actix_web::{post, web, HttpResponse};
use common::models::{StoreTokenRequest, StoreTokenResponse};
use common::AppError;
use crate::error::ApiError;
use crate::token_cache::TokenStore;

// Store a bearer token for five minutes and hand back its verification id
#[post("/store-token")]
pub async fn store_token(
    body: web::Json<StoreTokenRequest>,
    store: web::Data<dyn TokenStore>,
) -> Result<HttpResponse, ApiError> {
    let token = body
        .into_inner()
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::invalid_input("Access token required"))?;

    let verification_id = store.store(token).await.map_err(|e| {
        tracing::error!("Error storing token: {}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(StoreTokenResponse { verification_id }))
}
