use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,         // User ID
    pub username: String,
    pub kind: TokenKind,
    pub jti: Uuid,        // Token ID, persisted for refresh tokens
    pub exp: i64,         // Expiration timestamp
    pub iat: i64,         // Issued at timestamp
}

/// A signed token together with the identifiers needed to persist it.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub jti: Uuid,
    pub expires_at: chrono::DateTime<Utc>,
}

fn issue(
    user_id: i64,
    username: &str,
    kind: TokenKind,
    secret: &str,
    expires_in_secs: i64,
) -> Result<IssuedToken, AppError> {
    let now = Utc::now();
    let expires_at = now + Duration::seconds(expires_in_secs);
    let jti = Uuid::new_v4();

    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        kind,
        jti,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create token: {}", e)))?;

    Ok(IssuedToken {
        token,
        jti,
        expires_at,
    })
}

pub fn create_access_token(
    user_id: i64,
    username: &str,
    secret: &str,
    expires_in_secs: i64,
) -> Result<IssuedToken, AppError> {
    issue(user_id, username, TokenKind::Access, secret, expires_in_secs)
}

pub fn create_refresh_token(
    user_id: i64,
    username: &str,
    secret: &str,
    expires_in_secs: i64,
) -> Result<IssuedToken, AppError> {
    issue(user_id, username, TokenKind::Refresh, secret, expires_in_secs)
}

/// Decodes `token` and checks its signature, expiry and kind.
pub fn verify_token(token: &str, secret: &str, expected: TokenKind) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        AppError::Unauthorized
    })?;

    if token_data.claims.kind != expected {
        tracing::debug!("Token kind mismatch: expected {:?}", expected);
        return Err(AppError::Unauthorized);
    }

    Ok(token_data.claims)
}
