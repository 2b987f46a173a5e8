//! Products Service
//!
//! Serves the products domain over NATS request/reply, one subject per
//! message pattern.
//!
//! ## Architecture
//!
//! ```text
//! NATS (queue group: products-service)
//!   ↓ one subscription per pattern
//! ProductsServer
//!   ↓ envelope decode, one task per message
//! ProductRpcHandler → ProductService → PgProductRepository
//!   ↓
//! PostgreSQL (products table)
//! ```

pub mod config;
pub mod envelope;
pub mod messaging;
pub mod server;

use crate::config::Config;
use crate::messaging::NatsBroker;
use crate::server::ProductsServer;
use core_config::FromEnv;
use database::postgres::{check_health, connect_from_config_with_retry, run_migrations};
use domain_products::{PgProductRepository, ProductRpcHandler, ProductService};
use eyre::{Result, WrapErr};
use migration::Migrator;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Run the products service until SIGINT or SIGTERM
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();

    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    core_config::tracing::init_tracing(&config.environment);

    info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "Starting products service"
    );

    let db = connect_from_config_with_retry(config.postgres.clone(), None)
        .await
        .wrap_err("Failed to connect to PostgreSQL")?;

    if config.run_migrations {
        run_migrations::<Migrator>(&db, env!("CARGO_PKG_NAME"))
            .await
            .wrap_err("Failed to run migrations")?;
    }
    check_health(&db).await.wrap_err("Database health check failed")?;

    let service = ProductService::new(PgProductRepository::new(db.clone()));
    let handler = ProductRpcHandler::new(service);

    let broker = Arc::new(NatsBroker::connect(&config.nats).await?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Error waiting for shutdown signal: {:?}", e);
        }
        let _ = shutdown_tx.send(true);
    });

    let server = ProductsServer::new(broker, handler, config.nats);
    server.run(shutdown_rx).await?;
    drop(server);

    db.close()
        .await
        .wrap_err("Failed to close database connection")?;

    info!("Products service stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .wrap_err("Failed to install SIGTERM handler")?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.wrap_err("Failed to install Ctrl+C handler")?;
                info!("Received Ctrl+C, initiating shutdown...");
            },
            _ = terminate.recv() => {
                info!("Received SIGTERM, initiating shutdown...");
            },
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .wrap_err("Failed to install Ctrl+C handler")?;
        info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}
