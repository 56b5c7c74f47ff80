use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// A freshly generated password reset token. Only `digest` is ever stored.
pub struct ResetToken {
    pub raw: String,
    pub digest: String,
}

pub fn generate() -> ResetToken {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);
    ResetToken {
        digest: digest(&raw),
        raw,
    }
}

/// Hex SHA-256 of the raw token, as stored in `users.reset_token_hash`.
pub fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
