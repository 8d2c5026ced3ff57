use punch_journal::{
    AppConfig, AppState, RecordStore, resolve_data_path, router, scheduler::spawn_interval,
};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env();
    let data_path = resolve_data_path()?;
    if let Some(parent) = data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store = RecordStore::open(data_path).await;
    let state = AppState::new(store, &config.optimizer);

    info!(
        interval_secs = config.optimizer.interval.as_secs(),
        target_kb = config.optimizer.target_kb,
        min_size_kb = config.optimizer.min_size_kb,
        "image optimizer enabled"
    );
    let _optimizer = spawn_interval(state.clone(), config.optimizer.interval);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
