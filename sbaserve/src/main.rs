use sba_axum::{AppState, hub::EventHub, start_server};
use sba_core::services::Engine;
use sba_sqlite::Db;
use sbaserve::{AppConfig, Cli};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::select;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // By convention, we leverage `tracing` to instrument and log operations
    // throughout this project; subscribe so events reach stdio.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::import()?;
    let AppConfig {
        server,
        database,
        engine,
    } = AppConfig::load(&cli)?;

    let db = Db::open(&database).await?;
    let hub = EventHub::new(256);
    let engine = Arc::new(Engine::new(db, hub.clone(), engine));

    // Reconcile outstanding auctions and rounds against the job queue
    // before taking traffic.
    engine.bootstrap(OffsetDateTime::now_utc()).await?;

    let state = AppState {
        engine: engine.clone(),
        hub,
        config: Arc::new(server.clone()),
    };

    let worker_id = format!("worker-{}", std::process::id());
    let worker = tokio::spawn({
        let engine = engine.clone();
        async move { engine.run_worker(&worker_id).await }
    });
    let poller = tokio::spawn({
        let engine = engine.clone();
        async move { engine.run_poller().await }
    });
    let server_task = tokio::spawn(start_server(server, state));

    // The worker and poller loop forever; the server runs until bind/IO
    // failure or ctrl-c. Shut down in reverse construction order.
    select! {
        r = server_task => r??,
        _ = worker => {}
        _ = poller => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}
