use clap::Parser;
use er_core::{ConnectionUrl, Database};
use er_drivers::memory::{MemoryDriver, MemoryStore};
use std::sync::Arc;

mod api;
mod config;
mod logging;

use config::{Args, Config};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = logging::init(&args.log_level, args.log_file_path.as_deref()) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(args).await {
        tracing::error!("er-hub failed: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), BoxError> {
    let config = Config::load(&args.config)?;

    let registry = er_drivers::default_registry(memory_driver(&args).await?);
    tracing::debug!("Registered drivers: {:?}", registry.names());

    let database: Arc<dyn Database> = Arc::from(
        registry
            .connect(&args.connection_string, tracing::info_span!("database"))
            .await?,
    );

    let state = Arc::new(api::AppState {
        database: database.clone(),
        request_timeout: config.server.request_timeout(),
    });
    let app = api::router(state);

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("  er-hub v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("  Events:   http://{}/v1alpha1/events", addr);
    tracing::info!("  Search:   http://{}/v1alpha1/search/:id", addr);
    tracing::info!("  Timeout:  {:?}", config.server.request_timeout());
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, closing database");
    database.close().await?;
    Ok(())
}

/// The memory driver, pre-loaded from `--seed` when serving a memory:// URL.
async fn memory_driver(args: &Args) -> Result<MemoryDriver, BoxError> {
    let driver = MemoryDriver::new();
    let Some(seed) = &args.seed else {
        return Ok(driver);
    };

    let url = ConnectionUrl::parse(&args.connection_string)?;
    if url.scheme() != MemoryDriver::SCHEME {
        tracing::warn!(
            "Ignoring --seed {}: only memory:// databases can be seeded",
            seed.display()
        );
        return Ok(driver);
    }

    let store = MemoryStore::new();
    let json = tokio::fs::read_to_string(seed).await?;
    let loaded = store.load_json(&json).await?;
    tracing::info!("Seeded {} events from {}", loaded, seed.display());
    Ok(driver.with_store(url.database()?, store))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
