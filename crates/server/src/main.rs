use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use renditions_core::{
    load_config, validate_config, ComponentRegistry, InMemoryRegistry, LoaderExecutor,
    RenditionService, ServiceLoader, TransformCoreLoader,
};
use renditions_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("RENDITIONS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!(
        "Configuration loaded successfully ({} transform service(s))",
        config.transform_core.len()
    );

    // Flips to true on shutdown; aborts health probe backoff and polling.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let registry: Arc<dyn ComponentRegistry> = Arc::new(InMemoryRegistry::new());

    let mut loaders: Vec<Arc<dyn ServiceLoader>> = Vec::new();
    for descriptor in config.service_descriptors() {
        info!(
            "Configuring loader {} at {} (max_retries: {}, retry interval: {:?})",
            descriptor.name, descriptor.base_url, descriptor.max_retries, descriptor.retry_interval
        );
        let loader = TransformCoreLoader::from_descriptor(descriptor, Arc::clone(&registry))
            .context("Failed to create transform service client")?
            .with_shutdown(shutdown_rx.clone());
        loaders.push(Arc::new(loader));
    }
    let executor = Arc::new(LoaderExecutor::new(loaders, config.loaders.active));

    // Discovery runs in the background so the API is up immediately.
    let discovery_handle = match config.loaders.poll_interval() {
        Some(interval) => Arc::clone(&executor).spawn_polling(interval, shutdown_rx.clone()),
        None => {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move {
                let outcomes = executor.run_once().await;
                let loaded = outcomes.iter().filter(|o| o.is_success()).count();
                info!("Initial discovery finished: {}/{} loaders succeeded", loaded, outcomes.len());
            })
        }
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        RenditionService::new(Arc::clone(&registry)),
        executor,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = discovery_handle.await {
        warn!("Discovery task ended abnormally: {}", e);
    }
    info!("Discovery stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
