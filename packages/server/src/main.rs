use std::net::SocketAddr;

use tracing::{Level, info};

use assessment_server::config::AppConfig;
use assessment_server::state::AppState;
use assessment_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;
    info!("Configuration loaded");

    let db = database::init_db(&config.database.url, config.database.max_connections).await?;
    info!("Database connected and schema synced");

    seed::ensure_indexes(&db).await?;
    if let Some(ref bootstrap) = config.bootstrap {
        seed::ensure_admin(&db, bootstrap).await?;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState { db, config };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    info!("API docs at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
