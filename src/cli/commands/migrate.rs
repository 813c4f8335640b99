use clap::Args;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{CliServices, OutputFormat};

#[derive(Args)]
pub struct MigrateArgs {
    #[arg(long, help = "Apply to a single tenant slug")]
    pub tenant: Option<String>,

    #[arg(long, help = "Apply to every tenant schema")]
    pub all: bool,

    #[arg(long, help = "Path to the SQL script to apply")]
    pub file: String,
}

pub async fn handle(
    args: MigrateArgs,
    services: &CliServices,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let script = std::fs::read_to_string(&args.file)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", args.file, e))?;

    match (args.tenant, args.all) {
        (Some(slug), false) => {
            let tenant = services.directory.lookup(&slug).await?;
            services.provisioner.migrate_one(&tenant, &script).await?;
            output_success(
                output_format,
                &format!("Migrated tenant '{}'", slug),
                Some(json!({ "slug": slug })),
            )
        }
        (None, true) => {
            let report = services.provisioner.migrate_all(&script).await?;

            match output_format {
                OutputFormat::Json => {
                    let results: serde_json::Map<String, serde_json::Value> = report
                        .results
                        .iter()
                        .map(|(slug, outcome)| {
                            let value = match outcome {
                                Ok(()) => json!({ "success": true }),
                                Err(message) => json!({ "success": false, "error": message }),
                            };
                            (slug.clone(), value)
                        })
                        .collect();
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "succeeded": report.succeeded(),
                            "failed": report.failed(),
                            "results": results,
                        }))?
                    );
                }
                OutputFormat::Text => {
                    let mut slugs: Vec<_> = report.results.keys().collect();
                    slugs.sort();
                    for slug in slugs {
                        match &report.results[slug] {
                            Ok(()) => println!("✓ {}", slug),
                            Err(message) => println!("✗ {}: {}", slug, message),
                        }
                    }
                    println!(
                        "{} succeeded, {} failed",
                        report.succeeded(),
                        report.failed()
                    );
                }
            }

            // Partial failure is an operator decision, not a rollback; exit
            // nonzero so scripts notice
            if report.failed() > 0 {
                anyhow::bail!("{} tenant migration(s) failed", report.failed());
            }
            Ok(())
        }
        _ => anyhow::bail!("specify exactly one of --tenant <slug> or --all"),
    }
}
