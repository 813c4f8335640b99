use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{CliServices, OutputFormat};
use crate::services::provisioner::CreateTenant;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List all tenants")]
    List,

    #[command(about = "Show tenant information")]
    Info {
        #[arg(help = "Tenant slug")]
        slug: String,
    },

    #[command(about = "Provision a new tenant (registry row, schema, baseline, admin user)")]
    Create {
        #[arg(help = "Tenant slug (lowercase letters, digits, hyphens)")]
        slug: String,

        #[arg(help = "Display name")]
        name: String,

        #[arg(long, default_value = "standard", help = "Subscription plan")]
        plan: String,

        #[arg(long, help = "Provision straight to active instead of trial")]
        active: bool,

        #[arg(long, default_value_t = 14, help = "Trial length in days")]
        trial_days: i64,

        #[arg(long, default_value_t = 25, help = "Seat limit")]
        max_users: i32,

        #[arg(long, default_value_t = 10, help = "Storage limit in GB")]
        max_storage_gb: i32,

        #[arg(long, default_value = "", help = "Bootstrap admin email")]
        admin_email: String,

        #[arg(long, default_value = "", help = "Bootstrap admin name")]
        admin_name: String,
    },

    #[command(about = "Destroy a tenant: evict its pool, drop its schema, remove its registry row")]
    Drop {
        #[arg(help = "Tenant slug")]
        slug: String,
    },

    #[command(about = "Suspend an active tenant")]
    Suspend {
        #[arg(help = "Tenant slug")]
        slug: String,
    },

    #[command(about = "Reinstate a suspended tenant")]
    Reinstate {
        #[arg(help = "Tenant slug")]
        slug: String,
    },

    #[command(about = "Upgrade a trial tenant to active")]
    Upgrade {
        #[arg(help = "Tenant slug")]
        slug: String,
    },

    #[command(about = "Expire a tenant")]
    Expire {
        #[arg(help = "Tenant slug")]
        slug: String,
    },
}

pub async fn handle(
    cmd: TenantCommands,
    services: &CliServices,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        TenantCommands::List => {
            let tenants = services.directory.list().await?;

            match output_format {
                OutputFormat::Json => {
                    let tenants: Vec<_> = tenants.iter().map(tenant_json).collect();
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({ "tenants": tenants }))?
                    );
                }
                OutputFormat::Text => {
                    if tenants.is_empty() {
                        println!("No tenants registered");
                        return Ok(());
                    }
                    println!("{}", tenant_header());
                    println!("{}", "-".repeat(90));
                    for tenant in &tenants {
                        println!("{}", tenant_row(tenant));
                    }
                }
            }

            Ok(())
        }
        TenantCommands::Info { slug } => {
            let tenant = services.directory.lookup(&slug).await?;

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&tenant_json(&tenant))?);
                }
                OutputFormat::Text => {
                    println!("Tenant: {}", tenant.slug);
                    println!("Name: {}", tenant.name);
                    println!("Schema: {}", tenant.schema_name);
                    println!("Status: {}", tenant.status);
                    println!("Plan: {}", tenant.subscription_plan);
                    println!("Limits: {} users, {} GB", tenant.max_users, tenant.max_storage_gb);
                    println!("Created: {}", tenant.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
                    if let Some(t) = tenant.trial_ends_at {
                        println!("Trial ends: {}", t.format("%Y-%m-%d"));
                    }
                    if let Some(t) = tenant.subscription_ends_at {
                        println!("Subscription ends: {}", t.format("%Y-%m-%d"));
                    }
                }
            }

            Ok(())
        }
        TenantCommands::Create {
            slug,
            name,
            plan,
            active,
            trial_days,
            max_users,
            max_storage_gb,
            admin_email,
            admin_name,
        } => {
            let spec = CreateTenant {
                slug: slug.clone(),
                name,
                subscription_plan: plan,
                max_users,
                max_storage_gb,
                trial: !active,
                trial_days,
                admin_email,
                admin_name,
            };

            let tenant = services.provisioner.create(spec).await?;
            output_success(
                output_format,
                &format!("Tenant '{}' provisioned as {}", tenant.slug, tenant.status),
                Some(json!({ "tenant": tenant_json(&tenant) })),
            )
        }
        TenantCommands::Drop { slug } => {
            let tenant = services.directory.lookup(&slug).await?;
            services.provisioner.drop_tenant(&tenant).await?;
            output_success(
                output_format,
                &format!("Tenant '{}' dropped", slug),
                Some(json!({ "slug": slug })),
            )
        }
        TenantCommands::Suspend { slug } => {
            let tenant = services.provisioner.suspend(&slug).await?;
            output_success(
                output_format,
                &format!("Tenant '{}' suspended", tenant.slug),
                Some(json!({ "status": tenant.status })),
            )
        }
        TenantCommands::Reinstate { slug } => {
            let tenant = services.provisioner.reinstate(&slug).await?;
            output_success(
                output_format,
                &format!("Tenant '{}' reinstated", tenant.slug),
                Some(json!({ "status": tenant.status })),
            )
        }
        TenantCommands::Upgrade { slug } => {
            let tenant = services.provisioner.upgrade(&slug).await?;
            output_success(
                output_format,
                &format!("Tenant '{}' upgraded to active", tenant.slug),
                Some(json!({ "status": tenant.status })),
            )
        }
        TenantCommands::Expire { slug } => {
            let tenant = services.provisioner.expire(&slug).await?;
            output_success(
                output_format,
                &format!("Tenant '{}' expired", tenant.slug),
                Some(json!({ "status": tenant.status })),
            )
        }
    }
}
