use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use villa_api::config::{Config, StoreBackend};
use villa_api::entities::Villa;
use villa_api::repositories::{EntityStore, InMemoryStore, MySqlStore};
use villa_api::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Inizializza la configurazione
    let config = Config::from_env()?;

    // RUST_LOG ha la precedenza su LOG_LEVEL
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();
    config.print_info();

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    match config.store_backend {
        StoreBackend::MySql => {
            let url = config
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL must be set when STORE_BACKEND=mysql")?;
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .max_lifetime(Duration::from_secs(config.connection_lifetime_secs))
                .connect(url)
                .await?;
            info!("Connected to MySQL");
            serve(listener, MySqlStore::<Villa>::new(pool)).await?;
        }
        StoreBackend::Memory => {
            serve(listener, InMemoryStore::<Villa>::new()).await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn serve<S: EntityStore<Villa>>(listener: TcpListener, store: S) -> std::io::Result<()> {
    let app = create_router(Arc::new(AppState::new(store)));
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    // se il segnale non è installabile si resta in ascolto fino al kill
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
