use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{AppError, AppResult, AuthError};

/// PHC string for `plain` under a fresh random salt.
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            AppError::Internal(anyhow::anyhow!("hash password: {e}"))
        })
}

/// `Ok` when `plain` matches the stored hash. Any mismatch reads as bad credentials.
pub fn check_password(plain: &str, stored: &str) -> AppResult<()> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is unreadable");
        AppError::Internal(anyhow::anyhow!("parse password hash: {e}"))
    })?;
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials.into())
}

/// Does one hash worth of work, so rejecting an unknown email costs about as
/// much as rejecting a wrong password.
pub fn burn_password_check(plain: &str) {
    let _ = hash_password(plain);
}
