pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::database::router::ConnectionRouter;
use crate::services::directory::TenantDirectory;
use crate::services::provisioner::SchemaProvisioner;

#[derive(Parser)]
#[command(name = "tgate")]
#[command(about = "tenant-gate CLI - out-of-band tenant provisioning and migration")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the shared tenant registry table if missing")]
    Init,

    #[command(about = "Tenant lifecycle management")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "Apply a migration script to one or all tenant schemas")]
    Migrate {
        #[command(flatten)]
        args: commands::migrate::MigrateArgs,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Wired subsystem instances for CLI commands, built the same way the
/// server builds them
pub struct CliServices {
    pub router: Arc<ConnectionRouter>,
    pub directory: Arc<TenantDirectory>,
    pub provisioner: SchemaProvisioner,
}

impl CliServices {
    pub fn new() -> Self {
        let config = config::config();
        let router = Arc::new(ConnectionRouter::new(config.database.clone()));
        // Out-of-band operations should always see current state
        let directory = Arc::new(TenantDirectory::new(router.clone(), Duration::ZERO));
        let provisioner = SchemaProvisioner::new(router.clone(), directory.clone());
        Self {
            router,
            directory,
            provisioner,
        }
    }

    /// Close pools before the process exits
    pub async fn shutdown(&self) {
        self.router.dispose_all().await;
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let services = CliServices::new();

    let result = match cli.command {
        Commands::Init => commands::init::handle(&services, &output_format).await,
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, &services, &output_format).await,
        Commands::Migrate { args } => {
            commands::migrate::handle(args, &services, &output_format).await
        }
    };

    services.shutdown().await;
    result
}
