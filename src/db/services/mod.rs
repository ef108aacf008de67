//! Database access for each domain area.
//!
//! Handlers never build queries themselves; they call into these modules and
//! map the returned errors onto HTTP responses.

pub mod ingredient_service;
pub mod recipe_service;
pub mod subscription_service;
pub mod tag_service;
pub mod user_service;

pub use ingredient_service::*;
pub use recipe_service::*;
pub use subscription_service::*;
pub use tag_service::*;
pub use user_service::*;

use sea_orm::{DbErr, RuntimeErr};

/// True when the database rejected a write because of a unique key.
pub fn is_unique_violation(err: &DbErr) -> bool {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(database_error)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(database_error))) => {
            database_error.is_unique_violation()
        }
        _ => false,
    }
}
