// common/src/utils.rs
use std::str::FromStr;
use sha2::{Digest, Sha256};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Setup tracing for consistent logging across services.
/// The level comes from `LOG_LEVEL` and defaults to INFO.
pub fn setup_tracing() {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| Level::from_str(&v).ok())
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Short SHA-256 fingerprint of a bearer token, safe to put in logs
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

/// Shorten a wallet address to `0x12...abcd` for display
pub fn truncate_wallet_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_fingerprint() {
        let fp = token_fingerprint("abc123");
        assert_eq!(fp.len(), 12);
        assert_eq!(fp, token_fingerprint("abc123"));
        assert_ne!(fp, token_fingerprint("abc124"));
        assert!(!fp.contains("abc123"));
    }

    #[test]
    fn test_truncate_wallet_address() {
        assert_eq!(
            truncate_wallet_address("0x71C7656EC7ab88b098defB751B7401B5f6d8976F"),
            "0x71...976F"
        );
        assert_eq!(truncate_wallet_address("0x12345678"), "0x12345678");
        assert_eq!(truncate_wallet_address(""), "");
    }
}
