// Password hashing and validation service

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::auth::error::AuthError;
use crate::validation;

/// Password service for hashing and verification
///
/// Hashes are Argon2id PHC strings with a random per-password salt.
pub struct PasswordService {
    hasher: Argon2<'static>,
    dummy_hash: OnceLock<String>,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl PasswordService {
    pub fn with_params(params: Params) -> Self {
        Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: OnceLock::new(),
        }
    }

    /// Minimal-cost hasher for tests
    #[cfg(test)]
    pub fn fast() -> Self {
        match Params::new(Params::MIN_M_COST, 1, 1, None) {
            Ok(params) => Self::with_params(params),
            Err(_) => Self::default(),
        }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    }

    /// Verify a password against a stored hash
    ///
    /// A hash that cannot be parsed is an internal error, not a mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Burn one verification's worth of work for an unknown account
    ///
    /// Keeps "no such email" and "wrong password" close in response time.
    pub fn verify_dummy(&self, password: &str) {
        let hash = self
            .dummy_hash
            .get_or_init(|| self.hash_password("dummy-password-1").unwrap_or_default());
        if !hash.is_empty() {
            let _ = self.verify_password(password, hash);
        }
    }

    /// Validate password strength requirements
    pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
        validation::validate_password_strength(password).map_err(|_| {
            AuthError::Validation(format!(
                "Password must be at least {} characters and contain a letter and a digit",
                validation::MIN_PASSWORD_LENGTH
            ))
        })
    }
}
