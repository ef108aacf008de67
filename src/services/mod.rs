pub mod auth_service;
pub mod ingredient_loader;
pub mod media_service;
