use std::net::SocketAddr;

use greenlight::{app, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "greenlight=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr: SocketAddr = config.bind_addr().parse()?;
    tracing::info!(env = %config.env, "starting");

    let state = AppState::init(config).await?;
    sqlx::migrate!("./migrations").run(state.store.pool()).await?;
    tracing::info!("migrations applied");

    app::serve(app::build_app(state), addr).await
}
