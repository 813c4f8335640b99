use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::database::models::tenant::{Tenant, TenantStatus};
use crate::database::router::{ConnectionRouter, RouterError};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Tenant '{slug}' is not servable (status: {status})")]
    TenantInactive { slug: String, status: TenantStatus },

    #[error("Invalid status transition for '{slug}': {from} -> {to}")]
    InvalidTransition {
        slug: String,
        from: TenantStatus,
        to: TenantStatus,
    },

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const TENANT_COLUMNS: &str = "id, slug, name, schema_name, status, subscription_plan, \
     max_users, max_storage_gb, created_at, trial_ends_at, subscription_ends_at";

struct CachedTenant {
    tenant: Tenant,
    fetched_at: Instant,
}

/// The authoritative registry mapping slug -> tenant record, shared by every
/// service against the same table. An optional short-TTL cache fronts reads;
/// it is never consulted for writes, and every status write invalidates the
/// entry, so the TTL only bounds how long a stale status can route new
/// requests.
pub struct TenantDirectory {
    router: Arc<ConnectionRouter>,
    cache_ttl: Duration,
    cache: RwLock<HashMap<String, CachedTenant>>,
}

impl TenantDirectory {
    pub fn new(router: Arc<ConnectionRouter>, cache_ttl: Duration) -> Self {
        Self {
            router,
            cache_ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Look a tenant up by slug, regardless of status
    pub async fn lookup(&self, slug: &str) -> Result<Tenant, DirectoryError> {
        if let Some(tenant) = self.cached(slug).await {
            return Ok(tenant);
        }

        let tenant = self.fetch(slug).await?;
        self.store(tenant.clone()).await;
        Ok(tenant)
    }

    /// Look a tenant up and fail closed unless its status permits live
    /// routing. Callers on the request path use this, so a forgotten status
    /// check cannot route traffic into a suspended or expired tenant.
    pub async fn lookup_servable(&self, slug: &str) -> Result<Tenant, DirectoryError> {
        let tenant = self.lookup(slug).await?;
        if !tenant.is_servable() {
            warn!(
                "Refusing to serve tenant '{}' with status {}",
                slug, tenant.status
            );
            return Err(DirectoryError::TenantInactive {
                slug: slug.to_string(),
                status: tenant.status,
            });
        }
        Ok(tenant)
    }

    /// All registered tenants, straight from the table
    pub async fn list(&self) -> Result<Vec<Tenant>, DirectoryError> {
        let pool = self.router.shared_pool().await?;
        let tenants = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants ORDER BY created_at", TENANT_COLUMNS
        ))
        .fetch_all(&pool)
        .await?;
        Ok(tenants)
    }

    /// Transition a tenant's status under the lifecycle state machine.
    /// Always re-reads the table (never the cache) and invalidates the
    /// cache entry afterwards.
    pub async fn set_status(
        &self,
        slug: &str,
        next: TenantStatus,
    ) -> Result<Tenant, DirectoryError> {
        let current = self.fetch(slug).await?;
        if !current.status.can_transition_to(next) {
            return Err(DirectoryError::InvalidTransition {
                slug: slug.to_string(),
                from: current.status,
                to: next,
            });
        }

        let pool = self.router.shared_pool().await?;
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "UPDATE tenants SET status = $1 WHERE slug = $2 RETURNING {}",
            TENANT_COLUMNS
        ))
        .bind(next.as_str())
        .bind(slug)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| DirectoryError::TenantNotFound(slug.to_string()))?;

        debug!(
            "Tenant '{}' status: {} -> {}",
            slug, current.status, tenant.status
        );
        self.invalidate(slug).await;
        Ok(tenant)
    }

    /// Drop a slug from the read cache; called on every write affecting it
    pub async fn invalidate(&self, slug: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(slug);
    }

    async fn fetch(&self, slug: &str) -> Result<Tenant, DirectoryError> {
        let pool = self.router.shared_pool().await?;
        sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE slug = $1",
            TENANT_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| DirectoryError::TenantNotFound(slug.to_string()))
    }

    async fn cached(&self, slug: &str) -> Option<Tenant> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let cache = self.cache.read().await;
        let entry = cache.get(slug)?;
        if entry.fetched_at.elapsed() > self.cache_ttl {
            return None;
        }
        Some(entry.tenant.clone())
    }

    async fn store(&self, tenant: Tenant) {
        if self.cache_ttl.is_zero() {
            return;
        }
        let mut cache = self.cache.write().await;
        cache.insert(
            tenant.slug.clone(),
            CachedTenant {
                tenant,
                fetched_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::testing;

    fn directory(ttl: Duration) -> TenantDirectory {
        let router = Arc::new(ConnectionRouter::new(AppConfig::from_env().database));
        TenantDirectory::new(router, ttl)
    }

    #[tokio::test]
    async fn cache_stores_and_expires() {
        let dir = directory(Duration::from_secs(60));
        dir.store(testing::tenant("acme")).await;

        let hit = dir.cached("acme").await.unwrap();
        assert_eq!(hit.slug, "acme");
        assert!(dir.cached("other").await.is_none());

        dir.invalidate("acme").await;
        assert!(dir.cached("acme").await.is_none());
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let dir = directory(Duration::ZERO);
        dir.store(testing::tenant("acme")).await;
        assert!(dir.cached("acme").await.is_none());
    }
}
