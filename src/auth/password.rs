use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashingError(pub String);

/// One-way password transform and its comparator.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, HashingError>;
    /// Never errors: a stored secret that cannot be parsed simply does not match.
    fn verify(&self, secret: &str, plain: &str) -> bool;
}

/// Argon2id with a fresh salt per hash, stored as a PHC string.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                HashingError(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, secret: &str, plain: &str) -> bool {
        let parsed = match PasswordHash::new(secret) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "argon2 parse hash error");
                return false;
            }
        };
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}
