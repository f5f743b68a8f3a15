// secrets-server/src/secrets.rs
use crate::encryption::SecretsEncryptor;
use crate::token_cache::TokenStore;
use common::models::EncryptedSecretsBundle;
use common::{AppError, AppResult};
use std::sync::Arc;

/// Seals a snapshot of every live cached token for the oracle network
pub struct SecretsExporter {
    store: Arc<dyn TokenStore>,
    encryptor: Arc<dyn SecretsEncryptor>,
    oracle_public_key: Vec<u8>,
}

impl SecretsExporter {
    pub fn new(
        store: Arc<dyn TokenStore>,
        encryptor: Arc<dyn SecretsEncryptor>,
        oracle_public_key: Vec<u8>,
    ) -> Self {
        Self {
            store,
            encryptor,
            oracle_public_key,
        }
    }

    /// Best-effort snapshot: stores racing with the export may or may not be included
    pub async fn export(&self) -> AppResult<EncryptedSecretsBundle> {
        let secrets = self.store.live_tokens().await?;

        // BTreeMap keeps the keys sorted, so the JSON is canonical
        let plaintext = serde_json::to_string(&secrets)
            .map_err(|e| AppError::unavailable(format!("serializing secrets: {}", e)))?;

        let bundle = self
            .encryptor
            .encrypt_with_signature(&self.oracle_public_key, plaintext.as_bytes())?;

        tracing::info!("Exported {} cached tokens", secrets.len());
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::recipient::Recipient;
    use crate::encryption::{EncryptionError, SealedBoxEncryptor};
    use crate::token_cache::TokenCacheActor;
    use actix::Actor;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct UnreachableStore;

    #[async_trait(?Send)]
    impl TokenStore for UnreachableStore {
        async fn store(&self, _token: String) -> AppResult<String> {
            Err(AppError::unavailable("connection refused"))
        }

        async fn live_tokens(&self) -> AppResult<BTreeMap<String, String>> {
            Err(AppError::unavailable("connection refused"))
        }
    }

    struct BrokenEncryptor;

    impl SecretsEncryptor for BrokenEncryptor {
        fn encrypt_with_signature(
            &self,
            _public_key: &[u8],
            _plaintext: &[u8],
        ) -> Result<EncryptedSecretsBundle, EncryptionError> {
            Err(EncryptionError::Seal)
        }
    }

    #[actix_web::test]
    async fn export_decrypts_to_canonical_json_of_live_records() {
        let cache = TokenCacheActor::new().start();
        let store: Arc<dyn TokenStore> = Arc::new(cache);
        let first = store.store("abc123".to_string()).await.unwrap();
        let second = store.store("xyz789".to_string()).await.unwrap();

        let recipient = Recipient::generate();
        let exporter = SecretsExporter::new(
            store,
            Arc::new(SealedBoxEncryptor::generate().unwrap()),
            recipient.public_key.clone(),
        );

        let bundle = exporter.export().await.unwrap();
        let plaintext = String::from_utf8(recipient.open(&bundle).unwrap()).unwrap();

        let expected: BTreeMap<String, String> = [
            (first, "abc123".to_string()),
            (second, "xyz789".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(plaintext, serde_json::to_string(&expected).unwrap());
    }

    #[actix_web::test]
    async fn empty_cache_exports_empty_object() {
        let recipient = Recipient::generate();
        let exporter = SecretsExporter::new(
            Arc::new(TokenCacheActor::new().start()),
            Arc::new(SealedBoxEncryptor::generate().unwrap()),
            recipient.public_key.clone(),
        );

        let bundle = exporter.export().await.unwrap();
        assert_eq!(recipient.open(&bundle).unwrap(), b"{}".to_vec());
    }

    #[actix_web::test]
    async fn store_failure_is_unavailable() {
        let exporter = SecretsExporter::new(
            Arc::new(UnreachableStore),
            Arc::new(SealedBoxEncryptor::generate().unwrap()),
            vec![0u8; 32],
        );

        assert!(matches!(exporter.export().await, Err(AppError::Unavailable(_))));
    }

    #[actix_web::test]
    async fn encryption_failure_is_unavailable() {
        let exporter = SecretsExporter::new(
            Arc::new(TokenCacheActor::new().start()),
            Arc::new(BrokenEncryptor),
            vec![0u8; 32],
        );

        assert!(matches!(exporter.export().await, Err(AppError::Unavailable(_))));
    }
}
