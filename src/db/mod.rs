pub mod entities;
pub mod schema;
pub mod services;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Opens the connection pool and makes sure every table exists.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(max_connections)
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    schema::ensure_schema(&db).await?;
    info!(max_connections, "Database connection established.");
    Ok(db)
}
