use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Postgres identifier length limit; schema names must never exceed it
pub const MAX_SCHEMA_NAME_LEN: usize = 63;

/// One row in the shared tenant registry table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub schema_name: String,
    pub status: TenantStatus,
    pub subscription_plan: String,
    pub max_users: i32,
    pub max_storage_gb: i32,
    pub created_at: DateTime<Utc>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Pending,
    Trial,
    Active,
    Suspended,
    Expired,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Pending => "pending",
            TenantStatus::Trial => "trial",
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
            TenantStatus::Expired => "expired",
        }
    }

    /// Only trial and active tenants are routable; everything else fails
    /// closed at the directory lookup
    pub fn is_servable(&self) -> bool {
        matches!(self, TenantStatus::Active | TenantStatus::Trial)
    }

    /// Lifecycle state machine:
    /// pending -> trial | active (provisioning succeeds)
    /// trial -> active (upgrade), trial -> expired (timeout)
    /// active -> suspended, suspended -> active (reinstate)
    /// active | trial | suspended -> expired
    pub fn can_transition_to(&self, next: TenantStatus) -> bool {
        use TenantStatus::*;
        match (self, next) {
            (Pending, Trial) | (Pending, Active) => true,
            (Trial, Active) | (Trial, Expired) => true,
            (Active, Suspended) | (Active, Expired) => true,
            (Suspended, Active) | (Suspended, Expired) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TenantStatus::Pending),
            "trial" => Ok(TenantStatus::Trial),
            "active" => Ok(TenantStatus::Active),
            "suspended" => Ok(TenantStatus::Suspended),
            "expired" => Ok(TenantStatus::Expired),
            other => Err(format!("unknown tenant status: {}", other)),
        }
    }
}

// Stored as TEXT in the registry. Decode via FromStr; writes bind as_str().
impl sqlx::Type<sqlx::Postgres> for TenantStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TenantStatus {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

/// Validate a tenant slug: lowercase alphanumerics and hyphens, 3-50 chars.
/// The slug is the only user-supplied input that ever reaches an identifier
/// position, so this is the allow-list everything downstream relies on.
pub fn is_valid_slug(slug: &str) -> bool {
    (3..=50).contains(&slug.len())
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Derive the schema name for a slug: `tenant_` prefix, hyphens folded to
/// underscores, truncated to the Postgres identifier limit. Pure and stable
/// for the tenant's lifetime.
pub fn schema_name_for(slug: &str) -> String {
    let mut name = format!("tenant_{}", slug.replace('-', "_"));
    name.truncate(MAX_SCHEMA_NAME_LEN);
    name
}

impl Tenant {
    pub fn is_servable(&self) -> bool {
        self.status.is_servable()
    }
}
