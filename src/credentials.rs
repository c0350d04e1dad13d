//! Credential collaborator: password hashing and verification.

use crate::errors::{AppError, AppResult};
use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

pub trait CredentialHasher {
    fn hash(&self, plaintext: &str) -> AppResult<String>;

    /// False for a wrong password. Errors only for an unreadable stored hash.
    fn verify(&self, plaintext: &str, stored_hash: &str) -> AppResult<bool>;
}

/// Argon2id with default parameters, PHC string output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AppError::Credential(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, stored_hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| AppError::Credential(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = Argon2Hasher;
        let stored = h.hash("s3cret").unwrap();

        assert!(stored.starts_with("$argon2"));
        assert!(h.verify("s3cret", &stored).unwrap());
        assert!(!h.verify("wrong", &stored).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(Argon2Hasher.verify("x", "not-a-phc-string").is_err());
    }
}
