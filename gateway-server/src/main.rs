use catalog_gateway::{CatalogGateway, Config};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber.with(fmt::layer().with_target(true)).init();
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(error = %error, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    let app = CatalogGateway::postgres(config.connect_timeout(), config.query_timeout())
        .with_pagination(config.pagination())
        .into_router();

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        address = %address,
        query_timeout_secs = config.query_timeout_secs,
        max_per_page = config.max_per_page,
        "Starting catalog gateway v{}",
        env!("CARGO_PKG_VERSION")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
