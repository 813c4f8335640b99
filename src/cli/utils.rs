use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::database::models::tenant::Tenant;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(Value::Object(fields)) = data {
                response
                    .as_object_mut()
                    .expect("response is an object")
                    .extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

pub fn tenant_json(tenant: &Tenant) -> Value {
    json!({
        "id": tenant.id,
        "slug": tenant.slug,
        "name": tenant.name,
        "schema_name": tenant.schema_name,
        "status": tenant.status,
        "subscription_plan": tenant.subscription_plan,
        "max_users": tenant.max_users,
        "max_storage_gb": tenant.max_storage_gb,
        "created_at": tenant.created_at,
        "trial_ends_at": tenant.trial_ends_at,
        "subscription_ends_at": tenant.subscription_ends_at,
    })
}

/// One row of the text-format tenant table
pub fn tenant_row(tenant: &Tenant) -> String {
    format!(
        "{:<20} {:<12} {:<28} {:<12} {}",
        tenant.slug,
        tenant.status,
        tenant.schema_name,
        tenant.subscription_plan,
        tenant.created_at.format("%Y-%m-%d %H:%M")
    )
}

pub fn tenant_header() -> String {
    format!(
        "{:<20} {:<12} {:<28} {:<12} {}",
        "SLUG", "STATUS", "SCHEMA", "PLAN", "CREATED"
    )
}
