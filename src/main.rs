use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use task_board::auth::SessionKeys;
use task_board::config::AppConfig;
use task_board::{SharedData, build_router, logging, persistence};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    if dotenv().is_err() {
        println!("Starting server without .env file.");
    }
    let config = AppConfig::from_env()?;

    let otel_exporters = config
        .otel
        .as_ref()
        .map(logging::init_exporters)
        .transpose()?;
    logging::setup_logging_and_tracing(logging::init_env_filter()?, otel_exporters);

    let db_pool = persistence::connect_sqlx(&config.database_url, config.db_max_connections).await?;
    persistence::run_migrations(&db_pool).await?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
        session_keys: SessionKeys::new(
            &config.jwt_secret,
            config.session_ttl,
            config.secure_cookies,
        ),
    });
    let router = build_router(shared_data);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("binding to {}", config.bind_address))?;
    info!("Starting server on {}", config.bind_address);
    axum::serve(listener, router)
        .await
        .context("running the HTTP server")?;

    Ok(())
}
