use finance_tracker::{api::start_server, config::AppConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("finance_tracker=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("Personal Finance Tracker - API Server");
    info!("Port: {}", config.port);
    if config.database_url.is_none() {
        info!("DATABASE_URL not set, records are kept in memory only");
    }

    start_server(config).await?;

    Ok(())
}
