use calorie_ledger::{config::resolve_port, router, AppData, AppState, Settings};
use chrono::Local;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let settings = Settings::from_env();
    info!(
        goal = settings.daily_calorie_goal,
        tdee = settings.tdee,
        average_policy = %settings.average_policy,
        eviction_policy = %settings.eviction_policy,
        "loaded settings"
    );

    let state = AppState::new(AppData::new(Local::now().date_naive(), settings));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], resolve_port()));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
