// common/src/models/secrets.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /store-token`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTokenRequest {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Response of `POST /store-token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTokenResponse {
    pub verification_id: String,
}

/// Response of `GET /secrets`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsResponse {
    pub encrypted_secrets: EncryptedSecretsBundle,
}

/// Error body returned by both services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Sealed export of every live cached token, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedSecretsBundle {
    pub ephemeral_public_key: String,
    pub nonce: String,
    pub ciphertext: String,
    /// Ed25519 signature over the plaintext
    pub signature: String,
    pub signer_public_key: String,
}

/// Token held by the cache until `expires_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTokenRecord {
    pub verification_id: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedTokenRecord {
    pub fn new(verification_id: String, token: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            verification_id,
            token,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
