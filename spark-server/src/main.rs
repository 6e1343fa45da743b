use spark_server::config::AppConfig;
use spark_server::{build_router, AppState, SERVICE_NAME};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    spark_shared::middleware::init_tracing(SERVICE_NAME);

    let config = AppConfig::load()?;
    let port = config.port;

    let db = spark_shared::clients::db::create_pool(&config.database_url, config.database_pool_size)?;
    let metrics = spark_shared::middleware::init_metrics()?;

    let app = build_router(AppState::new(db, config, metrics));

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "{SERVICE_NAME} starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("{SERVICE_NAME} stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
