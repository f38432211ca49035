mod app;
mod config;
mod db;
mod state;
mod users;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "userdir=debug,axum=info,tower_http=info".to_string());
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
    let app_state = AppState::init(config).await?;

    if app_state.config.seed_default_users {
        if let Err(e) = users::seed::seed_if_empty(app_state.users.as_ref()).await {
            tracing::error!(error = %format!("{e:#}"), "seeding default users failed");
            app_state.close().await;
            return Err(e);
        }
    }

    let addr = app_state.config.bind_addr();
    let result = app::serve(app::build_app(app_state.clone()), &addr).await;
    app_state.close().await;
    result
}
