use clap::Parser;
use recipe_backend::db;
use recipe_backend::server::{config::ServerConfig, logging::init_logging};
use recipe_backend::services::ingredient_loader::load_ingredients_file;
use std::path::PathBuf;
use tracing::{error, info};

/// Replaces every ingredient with the rows of a `name,measurement_unit` CSV file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file to load
    #[arg(default_value = "data/ingredients.csv")]
    csv: PathBuf,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref())?;
    let _log_guard = init_logging(&config.log_dir, "load_ingredients.log");

    let db_pool = db::connect(&config.database_url, 1).await?;
    match load_ingredients_file(&db_pool, &args.csv).await {
        Ok(inserted) => {
            info!(inserted, path = %args.csv.display(), "Ingredient table replaced.");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Loading ingredients failed.");
            Err(e.into())
        }
    }
}
