//! Stateless session tokens (JWT, HS256)
//!
//! A session token is minted on login and carried in an HttpOnly cookie.
//! Validating one proves the request came from an authenticated operator
//! of this same instance, which is exactly the "self-originated" signal
//! the capture recorder's suppression policy needs.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const ISSUER: &str = "reqsink";

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject: the user's UUID
    pub sub: String,
    /// Issued at (unix timestamp)
    pub iat: i64,
    /// Expiration (unix timestamp)
    pub exp: i64,
    /// Issuer, always "reqsink"
    pub iss: String,
}

impl SessionClaims {
    pub fn new(user_id: Uuid, validity: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
            iss: ISSUER.to_string(),
        }
    }

    /// The user id carried in the token, if it parses as a UUID
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Session token errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to sign session token: {0}")]
    SigningFailed(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid or expired session token")]
    Invalid,
}

/// Mint a signed session token for the given user.
pub fn issue_session(secret: &[u8], user_id: Uuid, validity: Duration) -> Result<String, SessionError> {
    let claims = SessionClaims::new(user_id, validity);
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?;
    Ok(token)
}

/// Validate a session token: signature, expiry, and issuer.
pub fn validate_session(secret: &[u8], token: &str) -> Result<SessionClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    decode::<SessionClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| SessionError::Invalid)
}
