use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::Claims;
use crate::config::JwtConfig;

/// Token verification and signing failures.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    TokenExpired,
    #[error("malformed user_id claim")]
    MalformedClaim,
    #[error("token lifetime out of range")]
    LifetimeOutOfRange,
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Issues and checks session tokens bound to a user identifier.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, user_id: i64) -> Result<String, TokenError>;
    fn verify(&self, token: &str) -> Result<i64, TokenError>;
}

/// HMAC family accepted on verification. Anything else is treated as a forged token.
const ALLOWED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

// Claims are read loosely here so a well-signed token with a bad `user_id`
// surfaces as MalformedClaim rather than a decode error.
#[derive(Debug, Deserialize)]
struct IncomingClaims {
    #[serde(default)]
    user_id: serde_json::Value,
    exp: i64,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(cfg.secret.as_bytes(), cfg.ttl)
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation
    }
}

impl TokenSigner for JwtKeys {
    fn sign(&self, user_id: i64) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = now
            .checked_add(self.ttl)
            .ok_or(TokenError::LifetimeOutOfRange)?;
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    fn verify(&self, token: &str) -> Result<i64, TokenError> {
        let data = decode::<IncomingClaims>(token, &self.decoding, &Self::validation()).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                kind => {
                    warn!(?kind, "jwt rejected");
                    TokenError::InvalidSignature
                }
            }
        })?;

        // jsonwebtoken still accepts `exp == now`; a token is only valid strictly before exp.
        if OffsetDateTime::now_utc().unix_timestamp() >= data.claims.exp {
            return Err(TokenError::TokenExpired);
        }

        let user_id = match &data.claims.user_id {
            serde_json::Value::String(raw) => raw.parse::<i64>().ok(),
            _ => None,
        }
        .filter(|id| *id > 0)
        .ok_or(TokenError::MalformedClaim)?;

        debug!(user_id, "jwt verified");
        Ok(user_id)
    }
}
