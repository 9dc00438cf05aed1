use kidguard::{build_router, sqlite_state, AppConfig, DbConnection};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kidguard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting KidGuard server");

    let config = AppConfig::from_env();

    let db = DbConnection::open(&config.database_path).await?;
    let app_state = sqlite_state(&db, &config)?;
    let app = build_router(app_state, &config)?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Server running on http://localhost:{}", config.port);
    info!("Accepting requests from {}", config.frontend_url);
    axum::serve(listener, app).await?;

    Ok(())
}
