use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::models::tenant::{is_valid_slug, schema_name_for, Tenant, TenantStatus};
use crate::database::router::{ConnectionRouter, RouterError};
use crate::services::directory::{DirectoryError, TenantDirectory};

/// Provisioning step that failed; reported alongside whether compensating
/// teardown managed to undo the partial work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    Registration,
    SchemaCreation,
    BaselineInit,
    AdminBootstrap,
    Activation,
    Teardown,
}

impl std::fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProvisioningStep::Registration => "registration",
            ProvisioningStep::SchemaCreation => "schema creation",
            ProvisioningStep::BaselineInit => "baseline initialization",
            ProvisioningStep::AdminBootstrap => "admin bootstrap",
            ProvisioningStep::Activation => "activation",
            ProvisioningStep::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("Invalid tenant slug: {0}")]
    InvalidSlug(String),

    #[error("Tenant already exists: {0}")]
    AlreadyExists(String),

    #[error("Provisioning failed at {step} (cleanup succeeded: {cleanup_succeeded}): {source}")]
    StepFailed {
        step: ProvisioningStep,
        cleanup_succeeded: bool,
        #[source]
        source: sqlx::Error,
    },

    #[error("Migration failed for tenant '{slug}': {message}")]
    MigrationFailed { slug: String, message: String },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Request to provision a new tenant
#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub slug: String,
    pub name: String,
    pub subscription_plan: String,
    pub max_users: i32,
    pub max_storage_gb: i32,
    /// Provision into trial (with trial_ends_at) instead of active
    pub trial: bool,
    pub trial_days: i64,
    pub admin_email: String,
    pub admin_name: String,
}

impl CreateTenant {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            subscription_plan: "standard".to_string(),
            max_users: 25,
            max_storage_gb: 10,
            trial: true,
            trial_days: 14,
            admin_email: String::new(),
            admin_name: String::new(),
        }
    }
}

/// Outcome of a cross-tenant migration: per-slug success or failure, with
/// already-committed tenants left committed
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub results: HashMap<String, Result<(), String>>,
}

impl MigrationReport {
    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Out-of-band tenant lifecycle operations: create, drop, migrate. These
/// coordinate with the router's pool cache (eviction before schema drop)
/// and the directory (status transitions, cache invalidation).
pub struct SchemaProvisioner {
    router: Arc<ConnectionRouter>,
    directory: Arc<TenantDirectory>,
}

impl SchemaProvisioner {
    pub fn new(router: Arc<ConnectionRouter>, directory: Arc<TenantDirectory>) -> Self {
        Self { router, directory }
    }

    /// Provision a new tenant: register it (pending), create its schema,
    /// lay down the baseline tables and roles, bootstrap the admin user,
    /// then flip to trial/active. Any failure triggers best-effort
    /// compensating teardown so a half-initialized schema is never
    /// reachable through the directory.
    ///
    /// The registry insert leads: the slug-uniqueness constraint is what
    /// prevents two concurrent provisions of the same tenant, so it must
    /// fail before any DDL runs.
    pub async fn create(&self, spec: CreateTenant) -> Result<Tenant, ProvisioningError> {
        if !is_valid_slug(&spec.slug) {
            return Err(ProvisioningError::InvalidSlug(spec.slug));
        }
        let schema_name = schema_name_for(&spec.slug);

        let pool = self.router.shared_pool().await?;

        if self.slug_taken(&spec.slug).await? {
            return Err(ProvisioningError::AlreadyExists(spec.slug));
        }

        // Step 1: directory row, status pending
        let trial_ends_at = spec
            .trial
            .then(|| chrono::Utc::now() + chrono::Duration::days(spec.trial_days));
        let insert = sqlx::query(
            r#"
            INSERT INTO tenants
                (id, slug, name, schema_name, status, subscription_plan,
                 max_users, max_storage_gb, created_at, trial_ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&spec.slug)
        .bind(&spec.name)
        .bind(&schema_name)
        .bind(TenantStatus::Pending.as_str())
        .bind(&spec.subscription_plan)
        .bind(spec.max_users)
        .bind(spec.max_storage_gb)
        .bind(trial_ends_at)
        .execute(&pool)
        .await;

        if let Err(e) = insert {
            // Nothing to tear down yet
            return Err(ProvisioningError::StepFailed {
                step: ProvisioningStep::Registration,
                cleanup_succeeded: true,
                source: e,
            });
        }
        info!("Registered tenant '{}' (schema {})", spec.slug, schema_name);

        // Steps 2-4: schema DDL, baseline tables, admin user
        let provisioned = self.provision_schema(&pool, &schema_name, &spec).await;
        if let Err((step, e)) = provisioned {
            let cleanup_succeeded = self.teardown(&spec.slug, &schema_name).await;
            return Err(ProvisioningError::StepFailed {
                step,
                cleanup_succeeded,
                source: e,
            });
        }

        // Step 5: flip to the initial live status
        let initial = if spec.trial {
            TenantStatus::Trial
        } else {
            TenantStatus::Active
        };
        match self.directory.set_status(&spec.slug, initial).await {
            Ok(tenant) => {
                info!("Provisioned tenant '{}' as {}", spec.slug, initial);
                Ok(tenant)
            }
            Err(e) => {
                let cleanup_succeeded = self.teardown(&spec.slug, &schema_name).await;
                error!(
                    "Activation failed for '{}' (cleanup succeeded: {}): {}",
                    spec.slug, cleanup_succeeded, e
                );
                Err(e.into())
            }
        }
    }

    async fn provision_schema(
        &self,
        pool: &sqlx::PgPool,
        schema_name: &str,
        spec: &CreateTenant,
    ) -> Result<(), (ProvisioningStep, sqlx::Error)> {
        use sqlx::Executor;

        let quoted = ConnectionRouter::quote_identifier(schema_name);

        pool.execute(format!("CREATE SCHEMA {}", quoted).as_str())
            .await
            .map_err(|e| (ProvisioningStep::SchemaCreation, e))?;

        // Baseline tables and default roles inside the new schema. The
        // schema identifier is validated and quoted; everything else is
        // bound as parameters.
        let baseline = format!(
            r#"
            CREATE TABLE {schema}.roles (
                name text PRIMARY KEY,
                description text NOT NULL
            );
            CREATE TABLE {schema}.users (
                id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                email text NOT NULL UNIQUE,
                name text NOT NULL,
                role text NOT NULL REFERENCES {schema}.roles (name),
                created_at timestamptz NOT NULL DEFAULT now()
            );
            INSERT INTO {schema}.roles (name, description) VALUES
                ('admin', 'Full access within the tenant'),
                ('member', 'Standard user'),
                ('viewer', 'Read-only access');
            "#,
            schema = quoted
        );
        pool.execute(baseline.as_str())
            .await
            .map_err(|e| (ProvisioningStep::BaselineInit, e))?;

        let admin_email = if spec.admin_email.is_empty() {
            format!("admin@{}.invalid", spec.slug)
        } else {
            spec.admin_email.clone()
        };
        let admin_name = if spec.admin_name.is_empty() {
            "Administrator".to_string()
        } else {
            spec.admin_name.clone()
        };
        sqlx::query(&format!(
            "INSERT INTO {}.users (email, name, role) VALUES ($1, $2, 'admin')",
            quoted
        ))
        .bind(&admin_email)
        .bind(&admin_name)
        .execute(pool)
        .await
        .map_err(|e| (ProvisioningStep::AdminBootstrap, e))?;

        Ok(())
    }

    /// Best-effort compensating teardown: drop the schema, remove the
    /// directory row. Returns whether both undo steps succeeded.
    async fn teardown(&self, slug: &str, schema_name: &str) -> bool {
        use sqlx::Executor;

        let pool = match self.router.shared_pool().await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Teardown for '{}' could not reach the database: {}", slug, e);
                return false;
            }
        };

        let quoted = ConnectionRouter::quote_identifier(schema_name);
        let mut clean = true;

        if let Err(e) = pool
            .execute(format!("DROP SCHEMA IF EXISTS {} CASCADE", quoted).as_str())
            .await
        {
            error!("Teardown: failed to drop schema {}: {}", schema_name, e);
            clean = false;
        }

        if let Err(e) = sqlx::query("DELETE FROM tenants WHERE slug = $1")
            .bind(slug)
            .execute(&pool)
            .await
        {
            error!("Teardown: failed to remove directory row for '{}': {}", slug, e);
            clean = false;
        }

        self.directory.invalidate(slug).await;
        if clean {
            warn!("Rolled back partial provisioning for '{}'", slug);
        }
        clean
    }

    /// Destroy a tenant: evict its pool first so no session can be handed
    /// out against the dying namespace, then cascade-drop the schema, then
    /// remove the directory row.
    pub async fn drop_tenant(&self, tenant: &Tenant) -> Result<(), ProvisioningError> {
        use sqlx::Executor;

        self.router.evict(&tenant.schema_name).await;

        let pool = self.router.shared_pool().await?;
        let quoted = ConnectionRouter::quote_identifier(&tenant.schema_name);
        pool.execute(format!("DROP SCHEMA IF EXISTS {} CASCADE", quoted).as_str())
            .await?;

        sqlx::query("DELETE FROM tenants WHERE slug = $1")
            .bind(&tenant.slug)
            .execute(&pool)
            .await?;

        self.directory.invalidate(&tenant.slug).await;
        info!("Dropped tenant '{}' (schema {})", tenant.slug, tenant.schema_name);
        Ok(())
    }

    /// Apply a DDL/DML script to one tenant's schema, in one scoped session
    pub async fn migrate_one(
        &self,
        tenant: &Tenant,
        script: &str,
    ) -> Result<(), ProvisioningError> {
        use sqlx::Executor;

        let mut session = self.router.acquire(&tenant.schema_name).await?;
        session
            .conn()
            .execute(script)
            .await
            .map_err(|e| ProvisioningError::MigrationFailed {
                slug: tenant.slug.clone(),
                message: e.to_string(),
            })?;
        session.commit().await?;
        info!("Migrated tenant '{}'", tenant.slug);
        Ok(())
    }

    /// Apply a script to every tenant schema, sequentially. Explicitly
    /// partial-failure tolerant: one tenant's failure rolls back only that
    /// tenant's session; earlier commits stand, later tenants still run.
    pub async fn migrate_all(&self, script: &str) -> Result<MigrationReport, ProvisioningError> {
        let tenants = self.directory.list().await?;
        let mut report = MigrationReport::default();

        for tenant in &tenants {
            let outcome = match self.migrate_one(tenant, script).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!("Migration failed for '{}': {}", tenant.slug, e);
                    Err(e.to_string())
                }
            };
            report.results.insert(tenant.slug.clone(), outcome);
        }

        info!(
            "Migration complete: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    pub async fn suspend(&self, slug: &str) -> Result<Tenant, ProvisioningError> {
        Ok(self
            .directory
            .set_status(slug, TenantStatus::Suspended)
            .await?)
    }

    pub async fn reinstate(&self, slug: &str) -> Result<Tenant, ProvisioningError> {
        Ok(self.directory.set_status(slug, TenantStatus::Active).await?)
    }

    pub async fn upgrade(&self, slug: &str) -> Result<Tenant, ProvisioningError> {
        Ok(self.directory.set_status(slug, TenantStatus::Active).await?)
    }

    pub async fn expire(&self, slug: &str) -> Result<Tenant, ProvisioningError> {
        Ok(self.directory.set_status(slug, TenantStatus::Expired).await?)
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool, ProvisioningError> {
        let pool = self.router.shared_pool().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE slug = $1")
            .bind(slug)
            .fetch_one(&pool)
            .await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_spec_defaults_to_trial() {
        let spec = CreateTenant::new("acme", "Acme Corp");
        assert!(spec.trial);
        assert_eq!(spec.trial_days, 14);
        assert_eq!(spec.subscription_plan, "standard");
    }

    #[test]
    fn migration_report_counts() {
        let mut report = MigrationReport::default();
        report.results.insert("t1".to_string(), Ok(()));
        report
            .results
            .insert("t2".to_string(), Err("boom".to_string()));
        report.results.insert("t3".to_string(), Ok(()));

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(report.results["t1"].is_ok());
        assert!(report.results["t2"].is_err());
    }
}
