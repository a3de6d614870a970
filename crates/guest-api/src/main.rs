//! Guest API - Entry point.

use anyhow::Context;
use guest_api::{
    api::{create_router_with_rate_limit, with_debug_headers, AppState, RateLimitState},
    config::Config,
    store::Store,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Guest API");

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    // Initialize storage
    let store = if config.storage.persist {
        info!("Persisting tables under {:?}", config.storage.path);
        Store::file(config.storage.path.clone())
    } else {
        info!("Persistence disabled, using in-memory storage");
        Store::memory()
    };

    let state = AppState::load(store, config.countries.dataset_path.as_deref())
        .await
        .context("Failed to load application state")?;

    let rate_limit = RateLimitState::new(config.rate_limit.per_minute);
    let mut app = create_router_with_rate_limit(state, rate_limit);
    if config.server.debug_headers {
        info!("Debug headers enabled");
        app = with_debug_headers(app);
    }

    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
