//! Signed bearer tokens bound to a user's email
//! HS256 JWT with claims `{user, exp?}`

use crate::{config::AuthConfig, error::AppError};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Email the token was issued for
    pub user: String,

    /// Expiration (unix seconds); absent for non-expiring tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Why a token failed verification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// Issues and verifies tokens with a single process-wide secret
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: Option<u64>,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl_secs: Option<u64>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is optional and checked against an explicit clock in verify_at
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    /// Create codec from config
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        let secret = config.token_secret.expose_secret();

        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("Token secret too short (min 32 chars)".to_string()));
        }

        Ok(Self::new(secret.as_bytes(), config.token_ttl_secs))
    }

    /// Issue a token for `email`, expiring after the configured TTL
    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        self.issue_at(email, Utc::now().timestamp())
    }

    pub fn issue_at(&self, email: &str, now: i64) -> Result<String, TokenError> {
        let claims = Claims {
            user: email.to_string(),
            exp: self.ttl_secs.map(|ttl| now + ttl as i64),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            TokenError::Encode(e.to_string())
        })
    }

    /// Check signature and expiry against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::BadSignature,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })?
            .claims;

        if matches!(claims.exp, Some(exp) if now >= exp) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Whether a stored token is currently usable; absent tokens are not
    pub fn is_current(&self, token: Option<&str>) -> bool {
        token.is_some_and(|t| self.verify(t).is_ok())
    }
}
