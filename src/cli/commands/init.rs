use sqlx::Executor;

use crate::cli::utils::output_success;
use crate::cli::{CliServices, OutputFormat};

/// Minimal shared registry schema; every service reads this table
const REGISTRY_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS tenants (
    id uuid PRIMARY KEY,
    slug text NOT NULL UNIQUE,
    name text NOT NULL,
    schema_name text NOT NULL UNIQUE,
    status text NOT NULL,
    subscription_plan text NOT NULL,
    max_users integer NOT NULL,
    max_storage_gb integer NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now(),
    trial_ends_at timestamptz,
    subscription_ends_at timestamptz
);
"#;

pub async fn handle(services: &CliServices, output_format: &OutputFormat) -> anyhow::Result<()> {
    let pool = services.router.shared_pool().await?;
    pool.execute(REGISTRY_DDL).await?;

    output_success(output_format, "Tenant registry is ready", None)
}
