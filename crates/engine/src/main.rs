//! Content engine entry point.
//!
//! Connects to the PostgreSQL event log, applies migrations, then keeps the
//! read models caught up until SIGINT or SIGTERM.

use std::process::ExitCode;

use engine::{Engine, EngineConfig, EngineError, telemetry};
use event_store::PostgresEventStore;
use projections::ReadModel;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, shutting down");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}

async fn run(config: EngineConfig) -> Result<(), EngineError> {
    // 1. Observability
    telemetry::init_tracing(&config)?;
    telemetry::install_metrics(&config)?;

    // 2. Event store
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.require_database_url()?)
        .await?;
    let store = PostgresEventStore::new(pool);
    store.run_migrations().await?;

    // 3. Read models
    let engine = Engine::new(store);
    let delivered = engine.catch_up().await?;
    tracing::info!(
        delivered,
        field_types = engine.field_types_view().count(),
        content_types = engine.content_types_view().count(),
        contents = engine.contents_view().count(),
        "read models caught up"
    );
    engine.record_read_model_sizes();

    // 4. Follow the log
    let mut interval = tokio::time::interval(config.catch_up_interval);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = interval.tick() => {
                let delivered = engine.catch_up().await?;
                if delivered > 0 {
                    tracing::debug!(delivered, "read models advanced");
                    engine.record_read_model_sizes();
                }
            }
        }
    }

    tracing::info!("engine stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "engine failed");
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
