// JWT token generation and validation service

use crate::auth::error::AuthError;
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which half of a token pair a credential is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
///
/// Decoding fails when any field is missing or has the wrong JSON type, so a
/// verified `Claims` always carries a subject, a type and both timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Uuid,
    pub typ: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Access and refresh token issued together
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Token service for JWT operations
///
/// Holds the signing secret handed over at startup. Stateless otherwise, so a
/// single instance is shared by every request.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_duration: i64,  // in seconds
    refresh_token_duration: i64, // in seconds
}

impl TokenService {
    pub fn new(secret: &str, access_token_duration: i64, refresh_token_duration: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_duration,
            refresh_token_duration,
        }
    }

    pub fn access_token_duration(&self) -> i64 {
        self.access_token_duration
    }

    /// Sign a token for `subject` that expires `ttl_secs` from now
    pub fn issue(&self, subject: Uuid, typ: TokenType, ttl_secs: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject,
            typ,
            iat: now,
            exp: now + ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Verify signature, algorithm, expiry and claim shape
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidSignature => AuthError::BadSignature,
                _ => AuthError::InvalidToken,
            })
    }

    /// Issue a fresh access token plus refresh token for `subject`
    pub fn issue_pair(&self, subject: Uuid) -> Result<TokenPair, AuthError> {
        let access_token = self.issue(subject, TokenType::Access, self.access_token_duration)?;
        let refresh_token = self.issue(subject, TokenType::Refresh, self.refresh_token_duration)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_duration,
        })
    }
}
