use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tower::make::Shared;
use tracing_subscriber::EnvFilter;

use email_builder::config::AppConfig;
use email_builder::db;
use email_builder::routes;
use email_builder::state::AppState;
use email_builder::store::PgTemplateStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "server",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        cors_restricted = config.cors_allowed_origin.is_some(),
        "loaded backend configuration"
    );
    let pool = db::init_pool(&config.database_url, config.database_max_pool_size)?;
    let applied = {
        let pool = pool.clone();
        tokio::task::spawn_blocking(move || db::run_migrations(&pool)).await??
    };
    tracing::info!(applied, "database migrations complete");

    let listen_addr: SocketAddr = config.listen_address().parse()?;
    let store = Arc::new(PgTemplateStore::new(pool));
    let state = AppState::new(config, store);
    let router = routes::create_router(state)?;

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, Shared::new(router))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("server received shutdown signal");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
