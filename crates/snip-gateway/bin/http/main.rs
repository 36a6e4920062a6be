mod cli;

use crate::cli::{StorageBackendArg, CLI};
use clap::Parser;
use snip_gateway::{App, AppState};
use snip_generator::HashGenerator;
use snip_shortener::{ShortenerConfig, ShortenerService};
use snip_storage::{InMemoryRepository, MySqlRepository, MySqlSettings, Repository};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CLI::try_parse()?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .init();

    let shortener_config = ShortenerConfig::builder()
        .base_url(config.base_url.clone())
        .default_ttl(config.default_ttl()?)
        .build();

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        default_ttl = %config.default_ttl,
        "starting snip gateway"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            run_server(config.listen_addr, InMemoryRepository::new(), shortener_config).await?;
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .ok_or("mysql dsn is required when storage backend is mysql")?;
            let settings = MySqlSettings::builder().dsn(mysql_dsn).build();
            let repository = MySqlRepository::connect(&settings).await?;
            run_server(config.listen_addr, repository, shortener_config).await?;
        }
    }

    Ok(())
}

async fn run_server<R: Repository>(
    listen_addr: std::net::SocketAddr,
    repository: R,
    config: ShortenerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = Arc::new(ShortenerService::new(
        repository,
        HashGenerator::new(),
        config,
    ));
    let router = App::router(AppState::new(service.clone()));

    let listener = TcpListener::bind(listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    close_after_serve(served, service.repository()).await
}

/// Closes the repository whether or not serving succeeded, then reports the
/// serve error first.
async fn close_after_serve<R: Repository>(
    served: std::io::Result<()>,
    repository: &R,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = &served {
        error!(error = %err, "server failed");
    }

    info!("server stopped, closing repository");
    let closed = repository.close().await;

    served?;
    closed?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C signal"),
        () = terminate => info!("received SIGTERM signal"),
    }
}
