use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::auth::{Claims, Role, TokenType};
use crate::database::models::tenant::{schema_name_for, Tenant, TenantStatus};

/// Secret used by unit tests that mint their own tokens
pub const TEST_SECRET: &str = "test-secret-not-for-production";

/// Claims fixture: access token, one hour of validity, optional tenant
/// association
pub fn claims(role: Role, tenant_slug: Option<&str>) -> Claims {
    Claims {
        sub: format!("user-{}", Uuid::new_v4().simple()),
        role,
        tenant_id: tenant_slug.map(|_| Uuid::new_v4()),
        tenant_slug: tenant_slug.map(|s| s.to_string()),
        permissions: Vec::new(),
        token_type: TokenType::Access,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    }
}

/// Sign claims into a token the way the identity service would
pub fn mint_token(claims: Claims, secret: &str) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to sign test token")
}

/// An active tenant fixture for a slug
pub fn tenant(slug: &str) -> Tenant {
    tenant_with_status(slug, TenantStatus::Active)
}

pub fn tenant_with_status(slug: &str, status: TenantStatus) -> Tenant {
    Tenant {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        name: format!("{} Inc", slug),
        schema_name: schema_name_for(slug),
        status,
        subscription_plan: "standard".to_string(),
        max_users: 25,
        max_storage_gb: 10,
        created_at: Utc::now(),
        trial_ends_at: None,
        subscription_ends_at: None,
    }
}
