use std::sync::Arc;

use anyhow::Context;
use car_store::{handlers, logging, CarStore, Config};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    logging::init(config.log_format);

    let store = CarStore::builder(&config.db_path)
        .pretty(config.pretty)
        .build()
        .with_context(|| format!("cannot open {}", config.db_path.display()))?;
    let store = Arc::new(store);
    info!(path = %config.db_path.display(), records = store.len(), "collection ready");

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!(%addr, "car store listening");

    axum::serve(listener, handlers::router(Arc::clone(&store)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.flush()?;
    info!("collection flushed, bye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
