// secrets-server/src/utils/token.rs
use rand::{thread_rng, RngCore};

/// Random bytes behind each verification identifier
const VERIFICATION_ID_BYTES: usize = 16;

/// Generate a fresh verification identifier: 16 random bytes, hex encoded
pub fn generate_verification_id() -> String {
    let mut bytes = [0u8; VERIFICATION_ID_BYTES];
    thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
