//! Password hashing and verification using Argon2id
//!
//! The time cost comes from configuration and is checked against the
//! configured min/max bounds when the hasher is built; an out-of-bounds
//! cost refuses startup instead of failing per request.

use crate::{config::AppConfig, error::AppError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Build the hasher from configuration. Fatal on out-of-bounds cost.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let sec = &config.security;

        if sec.hash_time_cost < sec.hash_min_time_cost
            || sec.hash_time_cost > sec.hash_max_time_cost
        {
            return Err(AppError::Config(format!(
                "hash_time_cost {} outside configured bounds [{}, {}]",
                sec.hash_time_cost, sec.hash_min_time_cost, sec.hash_max_time_cost
            )));
        }

        let params = Params::new(sec.hash_memory_kib, sec.hash_time_cost, sec.hash_parallelism, None)
            .map_err(|e| AppError::Config(format!("invalid argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Ok(Self { argon2 })
    }

    /// Hash a password into a PHC string with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AppError::internal("failed to hash password")
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Check a password against a stored hash. A mismatch is `Ok(false)`;
    /// a malformed stored hash is an internal error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!("Stored password hash is malformed: {:?}", e);
            AppError::internal("stored password hash is malformed")
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                tracing::error!("Password verification failed: {:?}", e);
                Err(AppError::internal("password verification failed"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests_support::test_config;

    fn test_hasher() -> PasswordHasher {
        let mut config = test_config();
        // Keep unit tests fast
        config.security.hash_memory_kib = 8192;
        config.security.hash_time_cost = 2;
        config.security.hash_parallelism = 1;
        PasswordHasher::from_config(&config).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = test_hasher();
        let password = "password123";

        let hash = hasher.hash(password).unwrap();
        assert!(hasher.verify(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = test_hasher();

        let hash = hasher.hash("password123").unwrap();
        assert!(!hasher.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_different_each_time() {
        let hasher = test_hasher();
        let password = "password123";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        assert_ne!(hash1, hash2);
        assert!(hasher.verify(password, &hash1).unwrap());
        assert!(hasher.verify(password, &hash2).unwrap());
    }

    #[test]
    fn test_cost_outside_bounds_is_fatal() {
        let mut config = test_config();
        config.security.hash_time_cost = 100;
        config.security.hash_max_time_cost = 10;

        assert!(matches!(PasswordHasher::from_config(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_malformed_stored_hash_is_internal_error() {
        let hasher = test_hasher();
        assert!(matches!(
            hasher.verify("password123", "not-a-phc-string"),
            Err(AppError::Internal(_))
        ));
    }
}
