//! Token issuance and parsing
//!
//! Access tokens are self-contained HS256 JWTs carrying a typed claim set,
//! verifiable without a store round-trip. Refresh tokens are opaque random
//! strings used only as session-store keys, so they can be revoked and
//! rotated server-side.

use crate::{config::AppConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in an access token. Decoded once at parse time; a
/// missing or ill-typed field fails the parse.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// The identity a verified access token proves.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_exp_secs: u64,
}

impl TokenService {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // HS256 needs real key material
        if secret.trim().len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_exp_secs: config.security.access_token_exp_secs,
        })
    }

    /// Mint a signed access token for the given identity.
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.access_token_exp_secs as i64);

        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::internal("failed to encode access token")
        })
    }

    /// Verify and decode an access token. Bad signature, unexpected
    /// algorithm, expiry, or a malformed subject all surface as
    /// `InvalidToken`.
    pub fn parse_access_token(&self, token: &str) -> Result<ParsedToken, AppError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::InvalidToken
            })?;

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::InvalidToken)?;

        Ok(ParsedToken {
            user_id,
            email: data.claims.email,
            role: data.claims.role,
        })
    }

    /// Mint an opaque token: 32 bytes of OS randomness, hex-encoded.
    /// Used for refresh tokens and verification codes.
    pub fn new_opaque_token(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            tracing::error!("OS RNG failure: {:?}", e);
            AppError::internal("failed to generate token")
        })?;

        Ok(hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests_support::test_config;
    use secrecy::Secret;

    #[test]
    fn test_issue_and_parse_access_token() {
        let service = TokenService::from_config(&test_config()).unwrap();
        let user_id = Uuid::new_v4();

        let token = service.issue_access_token(user_id, "ann@x.com", "user").unwrap();
        let parsed = service.parse_access_token(&token).unwrap();

        assert_eq!(parsed.user_id, user_id);
        assert_eq!(parsed.email, "ann@x.com");
        assert_eq!(parsed.role, "user");
    }

    #[test]
    fn test_parse_garbage_fails() {
        let service = TokenService::from_config(&test_config()).unwrap();
        assert!(matches!(
            service.parse_access_token("not-a-token"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_parse_with_wrong_key_fails() {
        let issuer = TokenService::from_config(&test_config()).unwrap();

        let mut other_config = test_config();
        other_config.security.jwt_secret =
            Secret::new("another-secret-key-for-testing-min-32-chars".to_string());
        let verifier = TokenService::from_config(&other_config).unwrap();

        let token = issuer.issue_access_token(Uuid::new_v4(), "a@b.c", "user").unwrap();
        assert!(matches!(verifier.parse_access_token(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_fails() {
        let service = TokenService::from_config(&test_config()).unwrap();

        let now = Utc::now();
        let claims = AccessClaims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".to_string(),
            role: "user".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-key-for-testing-only-min-32-chars".as_bytes()),
        )
        .unwrap();

        assert!(matches!(service.parse_access_token(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_empty_jwt_secret_is_fatal() {
        let mut config = test_config();
        config.security.jwt_secret = Secret::new("".to_string());
        assert!(matches!(TokenService::from_config(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_opaque_token_is_64_hex_chars_and_unique() {
        let service = TokenService::from_config(&test_config()).unwrap();

        let a = service.new_opaque_token().unwrap();
        let b = service.new_opaque_token().unwrap();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
