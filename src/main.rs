use coffee_counter::{AppState, Config, EventStore, router};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Settings from .env, RUST_LOG included, must be in place before the filter is built.
    let dotenv = dotenvy::dotenv();

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded settings file");
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            error!("store credentials go in STORE_URL and STORE_KEY (or set STORE_BACKEND=file)");
            std::process::exit(2);
        }
    };

    let store = EventStore::connect(&config.store).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(users = ?config.users, cooldown_seconds = config.cooldown.num_seconds(), "configuration loaded");

    let app = router(AppState::new(config, store));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
