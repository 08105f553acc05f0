//! JWT validation and role-based authorization.
//!
//! Token *issuance* for login flows lives outside this service; this module
//! validates bearer tokens against the secret injected from [`AppConfig`]
//! at startup and exposes an explicit authorization predicate that handlers
//! evaluate before running their operation body.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;

/// Account types carried in token claims.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Pharmacy,
    Store,
    Admin,
}

/// Claim structure for JWT tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: account id
    pub sub: String,
    /// Account role
    pub role: Role,
    /// Unique identifier for this token
    pub jti: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Authenticated caller extracted from a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub role: Role,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Require the caller to hold one of the given roles.
///
/// Evaluated explicitly at the top of protected handlers rather than via
/// annotation-driven interception.
pub fn authorize(user: &AuthUser, required: &[Role]) -> Result<(), ServiceError> {
    if required.iter().any(|role| user.has_role(*role)) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "requires one of the roles: {}",
            required
                .iter()
                .map(Role::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

/// Authentication configuration, loaded once at startup and immutable after.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration_secs: u64,
}

impl AuthConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            token_expiration_secs: cfg.jwt_expiration,
        }
    }
}

/// Validates (and, for tests and tooling, issues) HS256 bearer tokens.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiration_secs: u64,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            token_expiration_secs: config.token_expiration_secs,
        }
    }

    /// Generate a signed token for an account.
    pub fn generate_token(&self, account_id: i32, role: Role) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + ChronoDuration::seconds(self.token_expiration_secs as i64);

        let claims = Claims {
            sub: account_id.to_string(),
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::AuthError(format!("failed to sign token: {e}")))
    }

    /// Validate a bearer token and extract the caller identity.
    pub fn validate_token(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {e}")))?;

        let id = data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;

        Ok(AuthUser {
            id,
            role: data.claims.role,
            token_id: data.claims.jti,
        })
    }
}

/// Axum middleware: validate the `Authorization: Bearer` header and attach
/// the authenticated caller to request extensions.
pub async fn require_auth(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(&req)
        .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?;

    let user = auth.validate_token(token)?;
    debug!(account_id = user.id, role = %user.role, "authenticated request");

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
