//! Authentication and authorization
//!
//! Tokens are HS256 JWTs. The `sub` claim is the acting [`ActorId`]; the
//! optional `actor_type` claim defaults to `user`.

use chrono::{Duration, Utc};
use core_kernel::ActorId;
use domain_ledger::ActorType;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (actor ID)
    pub sub: String,
    /// `user`, `system` or `webhook`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<String>,
    /// Actor's roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// The acting identity carried by `sub`
    pub fn actor_id(&self) -> Result<ActorId, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidSubject(self.sub.clone()))
    }

    pub fn actor_type(&self) -> Result<ActorType, AuthError> {
        match self.actor_type.as_deref() {
            None => Ok(ActorType::User),
            Some(value) => value
                .parse()
                .map_err(|_| AuthError::InvalidActorType(value.to_string())),
        }
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token subject is not an actor id: {0}")]
    InvalidSubject(String),
    #[error("Unknown actor type: {0}")]
    InvalidActorType(String),
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `actor_id` - Acting identity
/// * `actor_type` - Recorded on every transaction the token submits
/// * `roles` - Actor's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    actor_id: ActorId,
    actor_type: ActorType,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = i64::try_from(expiration_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or(AuthError::InvalidToken)?;

    let claims = Claims {
        sub: actor_id.as_uuid().to_string(),
        actor_type: Some(actor_type.as_str().to_ascii_lowercase()),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if the actor has the required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == "admin")
}

/// Fails with `MissingPermission` unless the actor has the role
pub fn require_role(claims: &Claims, required_role: &str) -> Result<(), AuthError> {
    if has_role(claims, required_role) {
        Ok(())
    } else {
        Err(AuthError::MissingPermission(required_role.to_string()))
    }
}

/// Permission definitions
pub mod permissions {
    /// Read-only balance recomputation
    pub const LEDGER_AUDIT: &str = "ledger:audit";
    /// Recomputation that overwrites the cached balance
    pub const LEDGER_REPAIR: &str = "ledger:repair";
}
