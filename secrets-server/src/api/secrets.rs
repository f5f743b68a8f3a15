// secrets-server/src/api/secrets.rs
use actix_web::{get, http::header, web, HttpRequest, HttpResponse};
use common::models::SecretsResponse;
use ring::digest;
use crate::error::ApiError;
use crate::secrets::SecretsExporter;

/// Optional shared secret in front of `GET /secrets`
#[derive(Clone, Debug, Default)]
pub struct ExportGuard {
    api_key: Option<String>,
}

impl ExportGuard {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.api_key.is_none()
    }

    fn authorize(&self, req: &HttpRequest) -> Result<(), ApiError> {
        let expected = match &self.api_key {
            Some(key) => key,
            None => return Ok(()),
        };

        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        // Fixed-length digests, compared whole
        let presented = digest::digest(&digest::SHA256, presented.as_bytes());
        let expected = digest::digest(&digest::SHA256, expected.as_bytes());
        if presented.as_ref() == expected.as_ref() {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

// Polled by the oracle network; returns every live token sealed to its key
#[get("/secrets")]
pub async fn get_secrets(
    req: HttpRequest,
    guard: web::Data<ExportGuard>,
    exporter: web::Data<SecretsExporter>,
) -> Result<HttpResponse, ApiError> {
    guard.authorize(&req).map_err(|e| {
        tracing::warn!("Rejected secrets export request");
        e
    })?;

    let encrypted_secrets = exporter.export().await.map_err(|e| {
        tracing::error!("Error encrypting secrets: {}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(SecretsResponse { encrypted_secrets }))
}
