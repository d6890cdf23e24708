use std::error::Error;

use clap::Parser;
use relief::{
    api::{self, AppState},
    config::{CliArgs, Config},
    store, telemetry,
};

fn main() -> Result<(), Box<dyn Error>> {
    let cli = CliArgs::parse();
    let config = Config::load(&cli)?;
    telemetry::init_logging(&config.logging);

    // Opened outside the runtime: the PostgreSQL client blocks on its own
    // runtime and must also be dropped outside ours.
    let store = store::open(&config.storage)?;

    let mut state = AppState::new(store.clone());
    if config.metrics.enabled {
        state = state.with_metrics(telemetry::install_metrics()?);
    }

    let addr = config.listen_addr()?;
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async move {
        let server = axum::Server::try_bind(&addr)?;
        tracing::info!(%addr, backend = ?config.storage.backend, "API listening");
        server
            .serve(api::router(state).into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
    })?;

    drop(runtime);
    drop(store);
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
