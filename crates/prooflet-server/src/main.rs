use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use prooflet_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prooflet=info".parse()?),
        )
        .json()
        .init();

    let cfg = prooflet_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Ensure data directory exists before opening DuckDB.
    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/prooflet.db", cfg.data_dir);
    let db = prooflet_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    let addr = format!("0.0.0.0:{}", cfg.port);
    let state = Arc::new(AppState::new(db, cfg.clone()));
    let app = prooflet_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "Prooflet listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
