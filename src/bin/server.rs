use clap::Parser;
use recipe_backend::db;
use recipe_backend::server::{config::ServerConfig, logging::init_logging};
use recipe_backend::services::media_service::{FsMediaStore, MediaStore};
use recipe_backend::web::create_axum_router;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    let _log_guard = init_logging(&server_config.log_dir, "server.log");
    info!(version = env!("CARGO_PKG_VERSION"), "Starting server.");

    let db_pool = match db::connect(&server_config.database_url, server_config.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to connect to the database.");
            return Err(e.into());
        }
    };

    tokio::fs::create_dir_all(&server_config.media_dir).await?;
    let media: Arc<dyn MediaStore> = Arc::new(FsMediaStore::new(&server_config.media_dir));

    let app = create_axum_router(db_pool, server_config.clone(), media);

    let listener = tokio::net::TcpListener::bind(&server_config.listen_addr).await?;
    info!(addr = %server_config.listen_addr, "HTTP server listening.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for the shutdown signal.");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}
