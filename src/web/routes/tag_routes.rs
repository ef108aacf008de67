use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::db::services;
use crate::web::models::recipe_models::TagResponse;
use crate::web::{AppError, AppState};

async fn get_tags_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = services::get_all_tags(&app_state.db_pool).await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

async fn get_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<Json<TagResponse>, AppError> {
    let tag = services::get_tag_by_id(&app_state.db_pool, tag_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag {tag_id} not found")))?;
    Ok(Json(tag.into()))
}

pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tags/", get(get_tags_handler))
        .route("/api/tags/{tag_id}/", get(get_tag_handler))
}
