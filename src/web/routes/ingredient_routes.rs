use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::services;
use crate::web::models::recipe_models::IngredientResponse;
use crate::web::extract::AppQuery;
use crate::web::{AppError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    /// Case-sensitive name prefix.
    pub name: Option<String>,
}

async fn get_ingredients_handler(
    State(app_state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<IngredientQuery>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let ingredients = services::get_ingredients(&app_state.db_pool, query.name.as_deref()).await?;
    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

async fn get_ingredient_handler(
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
) -> Result<Json<IngredientResponse>, AppError> {
    let ingredient = services::get_ingredient_by_id(&app_state.db_pool, ingredient_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ingredient {ingredient_id} not found")))?;
    Ok(Json(ingredient.into()))
}

pub fn create_ingredients_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ingredients/", get(get_ingredients_handler))
        .route("/api/ingredients/{ingredient_id}/", get(get_ingredient_handler))
}
