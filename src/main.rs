mod main_runtime;

use anyhow::Context;
use alertdog::adapters::{AlertmanagerClient, PagerDutyClient};
use alertdog::cli::{self, Cli, Commands};
use alertdog::config::AppConfig;
use alertdog::error::{AlertdogError, Result};
use alertdog::services::HttpServer;
use alertdog::supervisor::{Escalator, Monitor};
use clap::Parser;
use main_runtime::{init_logging, init_logging_simple, shutdown_signal};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate) => {
            init_logging_simple();
            let config = load_config(&cli)?;
            validate(&config)?;
            cli::print_config_summary(&config);
            println!("\x1b[32m✓ Configuration is valid\x1b[0m");
        }
        Some(Commands::Run) | None => {
            let config = load_config(&cli)?;
            init_logging(&config.logging);
            validate(&config)?;
            run(config).await?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    config.validate().map_err(|errors| {
        for e in &errors {
            error!("Invalid configuration: {}", e);
        }
        AlertdogError::Validation(errors.join("; "))
    })
}

async fn run(config: AppConfig) -> Result<()> {
    info!(
        "Starting alertdog ({} alertmanagers, {} expected watchdogs)",
        config.alertmanager_endpoints.len(),
        config.expected.len()
    );

    let backend = AlertmanagerClient::from_config(&config);
    let sink = PagerDutyClient::from_config(&config.pager_duty)?;
    let escalator = Escalator::from_config(Arc::new(sink), &config.pager_duty);
    let monitor = Arc::new(Monitor::from_config(&config, Arc::new(backend), escalator));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweep_handle = {
        let monitor = Arc::clone(&monitor);
        let check_interval = config.check_interval();
        tokio::spawn(async move { monitor.run(check_interval, shutdown_rx).await })
    };

    let server = HttpServer::new(Arc::clone(&monitor), config.port);
    let result = server
        .run(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await;

    if let Err(e) = sweep_handle.await {
        error!("Sweep task ended abnormally: {}", e);
    }

    info!("Shutdown complete");
    result
}
