// secrets-server/src/main.rs
mod api;
mod encryption;
mod error;
mod middleware;
mod secrets;
mod token_cache;
mod utils;

use std::io;
use std::sync::Arc;
use actix::Actor;
use actix_web::{web, App, HttpServer};
use common::{setup_tracing, Config};
use encryption::{parse_public_key, SealedBoxEncryptor};
use middleware::rate_limiter::RateLimiter;
use secrets::SecretsExporter;
use token_cache::{TokenCacheActor, TokenStore};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    setup_tracing();

    let config = Config::from_env();
    let server_addr = config.secrets_server_addr.clone();

    let oracle_public_key = parse_public_key(&config.oracle.public_key)
        .map_err(|e| startup_error("oracle public key", e))?;

    let encryptor = match &config.oracle.signer_key {
        Some(key) => SealedBoxEncryptor::from_base64(key),
        None => {
            tracing::warn!("No signer key configured, bundles are signed with an ephemeral key");
            SealedBoxEncryptor::generate()
        }
    }
    .map_err(|e| startup_error("signer key", e))?;
    tracing::info!("Signing bundles as {}", hex::encode(encryptor.signer_public_key()));

    let cache = TokenCacheActor::new()
        .with_ttl(chrono::Duration::seconds(config.token_cache.ttl_seconds))
        .with_cleanup_interval(config.token_cache.cleanup_interval_seconds)
        .start();
    let store: Arc<dyn TokenStore> = Arc::new(cache);

    let exporter = web::Data::new(SecretsExporter::new(
        store.clone(),
        Arc::new(encryptor),
        oracle_public_key,
    ));
    let store_data: web::Data<dyn TokenStore> = web::Data::from(store);

    let guard = web::Data::new(api::secrets::ExportGuard::new(config.oracle.export_api_key.clone()));
    if guard.is_open() {
        tracing::warn!("GET /secrets is unauthenticated: every caller receives every cached token");
    }

    let limiter = RateLimiter::from_config(&config.rate_limit);
    let pruned = limiter.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(pruned.window().max(std::time::Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let removed = pruned.prune_idle();
            if removed > 0 {
                tracing::debug!("Pruned {} idle rate limit entries", removed);
            }
        }
    });

    tracing::info!("Starting Secrets Server on {}", server_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(limiter.clone())
            .app_data(api::json_config())
            .app_data(store_data.clone())
            .app_data(exporter.clone())
            .app_data(guard.clone())
            .configure(api::configure)
    })
    .bind(&server_addr)?
    .run()
    .await
}
