pub mod guard;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// Claims consumed from a verified bearer token. Issued and signed by the
/// external identity service; this core only verifies signature/expiry and
/// trusts the claim contents verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    #[serde(default)]
    pub tenant_slug: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    TenantAdmin,
    TenantUser,
    TenantViewer,
    Service,
}

impl Role {
    /// Roles that only make sense inside a tenant; these carry a
    /// tenant_slug claim and are confined to it
    pub fn is_tenant_scoped(&self) -> bool {
        matches!(
            self,
            Role::TenantAdmin | Role::TenantUser | Role::TenantViewer
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Service,
}

/// The authenticated caller for one request. Built from verified claims,
/// immutable for the request's duration, never persisted.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub subject: String,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
    pub tenant_slug: Option<String>,
    pub permissions: Vec<String>,
    pub token_type: TokenType,
}

impl From<Claims> for AuthenticatedPrincipal {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role,
            tenant_id: claims.tenant_id,
            tenant_slug: claims.tenant_slug,
            permissions: claims.permissions,
            token_type: claims.token_type,
        }
    }
}

impl AuthenticatedPrincipal {
    /// Service principals (machine-to-machine callers) bypass tenant
    /// confinement entirely
    pub fn is_service(&self) -> bool {
        self.token_type == TokenType::Service || self.role == Role::Service
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("JWT secret not configured")]
    SecretNotConfigured,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

/// Verify a bearer token's signature and expiry and extract its claims
pub fn verify_token(token: &str) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;
    verify_token_with_secret(token, secret)
}

pub fn verify_token_with_secret(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::SecretNotConfigured);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}
