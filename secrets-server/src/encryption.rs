// secrets-server/src/encryption.rs
//! Sealing of exported secrets for the oracle network.
//!
//! A bundle is produced with an ephemeral X25519 key agreement against the
//! oracle public key, HKDF-SHA256 to derive an AES-256-GCM key, and an
//! Ed25519 signature over the plaintext by this server's signing key. Only
//! the holder of the oracle private key can open it.

use common::models::EncryptedSecretsBundle;
use common::AppError;
use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::agreement::{self, EphemeralPrivateKey, UnparsedPublicKey};
use ring::hkdf;
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{Ed25519KeyPair, KeyPair};
use thiserror::Error;

const HKDF_INFO: &[u8] = b"tunecred-secrets-export-v1";
pub const PUBLIC_KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("invalid recipient public key")]
    InvalidPublicKey,
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),
    #[error("key agreement failed")]
    KeyAgreement,
    #[error("sealing failed")]
    Seal,
    #[error("random source unavailable")]
    Random,
}

impl From<EncryptionError> for AppError {
    fn from(err: EncryptionError) -> Self {
        AppError::unavailable(format!("encryption: {}", err))
    }
}

/// Encryption-with-signature primitive used by the secrets export
pub trait SecretsEncryptor: Send + Sync {
    fn encrypt_with_signature(
        &self,
        public_key: &[u8],
        plaintext: &[u8],
    ) -> Result<EncryptedSecretsBundle, EncryptionError>;
}

/// Decode the configured oracle public key (hex, optional `0x` prefix)
pub fn parse_public_key(encoded: &str) -> Result<Vec<u8>, EncryptionError> {
    let trimmed = encoded.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(trimmed).map_err(|_| EncryptionError::InvalidPublicKey)?;
    if bytes.len() != PUBLIC_KEY_LEN {
        return Err(EncryptionError::InvalidPublicKey);
    }
    Ok(bytes)
}

fn derive_key(
    shared_secret: &[u8],
    ephemeral_public_key: &[u8],
    recipient_public_key: &[u8],
) -> Result<LessSafeKey, EncryptionError> {
    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, ephemeral_public_key);
    let prk = salt.extract(shared_secret);
    let info = [HKDF_INFO, recipient_public_key];
    let okm = prk
        .expand(&info, &aead::AES_256_GCM)
        .map_err(|_| EncryptionError::KeyAgreement)?;
    Ok(LessSafeKey::new(UnboundKey::from(okm)))
}

pub struct SealedBoxEncryptor {
    signer: Ed25519KeyPair,
    rng: SystemRandom,
}

impl SealedBoxEncryptor {
    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Self, EncryptionError> {
        let signer = Ed25519KeyPair::from_pkcs8(pkcs8)
            .map_err(|e| EncryptionError::InvalidSigningKey(e.to_string()))?;
        Ok(Self {
            signer,
            rng: SystemRandom::new(),
        })
    }

    /// Signing key as configured: base64 of a PKCS#8 document
    pub fn from_base64(encoded: &str) -> Result<Self, EncryptionError> {
        let pkcs8 = base64::decode(encoded.trim())
            .map_err(|e| EncryptionError::InvalidSigningKey(e.to_string()))?;
        Self::from_pkcs8(&pkcs8)
    }

    /// Fresh signing key, lost on restart
    pub fn generate() -> Result<Self, EncryptionError> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| EncryptionError::Random)?;
        Self::from_pkcs8(pkcs8.as_ref())
    }

    pub fn signer_public_key(&self) -> &[u8] {
        self.signer.public_key().as_ref()
    }
}

impl SecretsEncryptor for SealedBoxEncryptor {
    fn encrypt_with_signature(
        &self,
        public_key: &[u8],
        plaintext: &[u8],
    ) -> Result<EncryptedSecretsBundle, EncryptionError> {
        if public_key.len() != PUBLIC_KEY_LEN {
            return Err(EncryptionError::InvalidPublicKey);
        }

        let ephemeral = EphemeralPrivateKey::generate(&agreement::X25519, &self.rng)
            .map_err(|_| EncryptionError::Random)?;
        let ephemeral_public = ephemeral
            .compute_public_key()
            .map_err(|_| EncryptionError::KeyAgreement)?;

        let peer = UnparsedPublicKey::new(&agreement::X25519, public_key);
        let key = agreement::agree_ephemeral(ephemeral, &peer, |shared_secret| {
            derive_key(shared_secret, ephemeral_public.as_ref(), public_key)
        })
        .map_err(|_| EncryptionError::KeyAgreement)??;

        let mut nonce = [0u8; aead::NONCE_LEN];
        self.rng.fill(&mut nonce).map_err(|_| EncryptionError::Random)?;

        let mut sealed = plaintext.to_vec();
        key.seal_in_place_append_tag(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut sealed)
            .map_err(|_| EncryptionError::Seal)?;

        let signature = self.signer.sign(plaintext);

        Ok(EncryptedSecretsBundle {
            ephemeral_public_key: hex::encode(ephemeral_public.as_ref()),
            nonce: hex::encode(nonce),
            ciphertext: hex::encode(&sealed),
            signature: hex::encode(signature.as_ref()),
            signer_public_key: hex::encode(self.signer_public_key()),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::recipient::Recipient;
    use super::*;

    #[test]
    fn sealed_bundle_opens_for_recipient() {
        let encryptor = SealedBoxEncryptor::generate().unwrap();
        let recipient = Recipient::generate();

        let bundle = encryptor
            .encrypt_with_signature(&recipient.public_key, br#"{"id":"token"}"#)
            .unwrap();

        assert_eq!(bundle.signer_public_key, hex::encode(encryptor.signer_public_key()));
        assert_ne!(bundle.ciphertext, hex::encode(br#"{"id":"token"}"#));
        assert_eq!(recipient.open(&bundle).unwrap(), br#"{"id":"token"}"#.to_vec());
    }

    #[test]
    fn other_recipient_cannot_open() {
        let encryptor = SealedBoxEncryptor::generate().unwrap();
        let intended = Recipient::generate();
        let eavesdropper = Recipient::generate();

        let bundle = encryptor
            .encrypt_with_signature(&intended.public_key, b"secret")
            .unwrap();

        assert!(eavesdropper.open(&bundle).is_err());
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let encryptor = SealedBoxEncryptor::generate().unwrap();
        let recipient = Recipient::generate();

        let mut bundle = encryptor
            .encrypt_with_signature(&recipient.public_key, b"secret")
            .unwrap();
        let mut bytes = hex::decode(&bundle.ciphertext).unwrap();
        bytes[0] ^= 0xff;
        bundle.ciphertext = hex::encode(bytes);

        assert!(recipient.open(&bundle).is_err());
    }

    #[test]
    fn public_key_parsing() {
        let key = "11".repeat(32);
        assert_eq!(parse_public_key(&key).unwrap().len(), 32);
        assert_eq!(parse_public_key(&format!("0x{}", key)).unwrap().len(), 32);
        assert!(parse_public_key("abcd").is_err());
        assert!(parse_public_key("zz").is_err());
        assert!(parse_public_key("").is_err());
    }

    #[test]
    fn signing_key_round_trips_through_base64() {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        let encoded = base64::encode(pkcs8.as_ref());

        let first = SealedBoxEncryptor::from_base64(&encoded).unwrap();
        let second = SealedBoxEncryptor::from_base64(&encoded).unwrap();
        assert_eq!(first.signer_public_key(), second.signer_public_key());
        assert!(SealedBoxEncryptor::from_base64("not a key").is_err());
    }
}
