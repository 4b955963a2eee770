//! DriveSentry daemon
//!
//! Watches a cloud storage account and revokes "anyone with the link"
//! sharing as soon as new files appear.

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::Settings;
use drivesentry_core::engine::RemediationEngine;
use drivesentry_core::gateway::{DriveGateway, StorageGateway};
use drivesentry_core::orchestrator::{Orchestrator, TriggerMode};
use drivesentry_core::trigger::{ChangeTrigger, PollTrigger, PushTrigger};
use drivesentry_core::tunnel::TunnelProcess;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "drivesentry",
    version,
    about = "Revokes public link sharing as soon as new files appear"
)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured trigger mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Poll,
    Push,
}

impl From<ModeArg> for TriggerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Poll => TriggerMode::Poll,
            ModeArg::Push => TriggerMode::Push,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run the monitoring loop (default)
    Run,
    /// Print account information and exit
    About,
    /// Report one file's permission entries and exit
    Inspect { file_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("DriveSentry v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&config_path)?;
    if let Some(mode) = cli.mode {
        settings.mode = mode.into();
    }
    if let Some(path) = &settings.credentials_path {
        debug!("Using credential store at {}", path.display());
    }

    let gateway = Arc::new(
        DriveGateway::new(
            &settings.base_api_url,
            &settings.base_activity_url,
            &settings.api_key,
            &settings.access_token,
        )
        .context("failed to create storage gateway")?,
    );
    let storage: Arc<dyn StorageGateway> = gateway.clone();
    let engine = RemediationEngine::new(storage);

    match cli.command.unwrap_or(Command::Run) {
        Command::About => log_account_info(gateway.as_ref()).await,
        Command::Inspect { file_id } => engine
            .describe_file(&file_id)
            .await
            .with_context(|| format!("failed to inspect file {}", file_id)),
        Command::Run => run(settings, gateway, engine).await,
    }
}

async fn log_account_info(gateway: &dyn StorageGateway) -> anyhow::Result<()> {
    let account = gateway
        .get_account_info()
        .await
        .context("failed to fetch account info")?;
    match account.user {
        Some(user) => info!(
            "Account: {} ({})",
            user.display_name.as_deref().unwrap_or("unknown"),
            user.email_address.as_deref().unwrap_or("unknown"),
        ),
        None => warn!("Account info did not include a user"),
    }
    Ok(())
}

async fn run(
    settings: Settings,
    gateway: Arc<DriveGateway>,
    engine: RemediationEngine,
) -> anyhow::Result<()> {
    // Startup identity check; the loop still starts if the endpoint is down.
    if let Err(e) = log_account_info(gateway.as_ref()).await {
        warn!("Could not fetch account info: {:#}", e);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("Failed to listen for interrupt: {}", e),
        }
    });

    let gateway: Arc<dyn StorageGateway> = gateway;
    let trigger: Box<dyn ChangeTrigger> = match settings.mode {
        TriggerMode::Poll => Box::new(PollTrigger::new(
            gateway,
            engine,
            settings.poll_interval(),
        )),
        TriggerMode::Push => {
            let tunnel =
                TunnelProcess::new(settings.tunnel_command.clone(), settings.tunnel_args());
            Box::new(PushTrigger::new(gateway, engine, Box::new(tunnel)))
        }
    };

    Orchestrator::new(trigger)
        .run(shutdown_rx)
        .await
        .context("monitoring loop failed")
}
