use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use std::sync::Arc;
use tracing::warn;

use crate::db::services::{RecipeDraft, RecipeService};
use crate::services::media_service::decode_image;
use crate::validation::Validate;
use crate::web::middleware::auth;
use crate::web::models::AuthenticatedUser;
use crate::web::models::recipe_models::{RecipeResponse, RecipeWriteRequest};
use crate::web::extract::AppJson;
use crate::web::{AppError, AppState};

/// How much of the payload a write must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Create,
    Replace,
    Partial,
}

/// Validates the payload, then decodes and stores its image. All field
/// problems are reported together; nothing is written unless they are none.
async fn prepare_draft(
    app_state: &AppState,
    payload: RecipeWriteRequest,
    mode: WriteMode,
) -> Result<RecipeDraft, AppError> {
    let (mut draft, encoded_image) = payload.into_draft();

    let mut errors = draft.validate().err().unwrap_or_default();
    match mode {
        WriteMode::Create => errors.merge(draft.missing_fields(encoded_image.is_none())),
        WriteMode::Replace => errors.merge(draft.missing_fields(false)),
        WriteMode::Partial => {}
    }

    let decoded = match encoded_image.as_deref().map(decode_image).transpose() {
        Ok(decoded) => decoded,
        Err(e) => {
            errors.add("image", e.to_string());
            None
        }
    };
    errors.into_result()?;

    if let Some(image) = decoded {
        draft.image = Some(app_state.media.save_recipe_image(&image).await?);
    }
    Ok(draft)
}

/// Best-effort removal of a stored image that is no longer referenced.
async fn discard_image(app_state: &AppState, reference: Option<String>) {
    if let Some(reference) = reference {
        if let Err(e) = app_state.media.remove(&reference).await {
            warn!(reference = %reference, error = %e, "Failed to remove recipe image.");
        }
    }
}

async fn get_recipes_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let recipes = RecipeService::get_recipes(&app_state.db_pool).await?;
    Ok(Json(recipes.into_iter().map(Into::into).collect()))
}

async fn get_recipe_handler(
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = RecipeService::get_recipe_by_id(&app_state.db_pool, recipe_id).await?;
    Ok(Json(recipe.into()))
}

async fn create_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RecipeWriteRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    let draft = prepare_draft(&app_state, payload, WriteMode::Create).await?;
    let stored_image = draft.image.clone();

    match RecipeService::create_recipe(&app_state.db_pool, authenticated_user.id, draft).await {
        Ok(details) => Ok((StatusCode::CREATED, Json(details.into()))),
        Err(e) => {
            discard_image(&app_state, stored_image).await;
            Err(e.into())
        }
    }
}

async fn update_recipe(
    app_state: &AppState,
    authenticated_user: &AuthenticatedUser,
    recipe_id: i32,
    payload: RecipeWriteRequest,
    mode: WriteMode,
) -> Result<Json<RecipeResponse>, AppError> {
    let draft = prepare_draft(app_state, payload, mode).await?;
    let stored_image = draft.image.clone();

    match RecipeService::update_recipe(&app_state.db_pool, recipe_id, authenticated_user.id, draft).await {
        Ok(update) => {
            discard_image(app_state, update.replaced_image).await;
            Ok(Json(update.details.into()))
        }
        Err(e) => {
            discard_image(app_state, stored_image).await;
            Err(e.into())
        }
    }
}

async fn put_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    AppJson(payload): AppJson<RecipeWriteRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    update_recipe(&app_state, &authenticated_user, recipe_id, payload, WriteMode::Replace).await
}

async fn patch_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    AppJson(payload): AppJson<RecipeWriteRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    update_recipe(&app_state, &authenticated_user, recipe_id, payload, WriteMode::Partial).await
}

async fn delete_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let image = RecipeService::delete_recipe(&app_state.db_pool, recipe_id, authenticated_user.id).await?;
    discard_image(&app_state, Some(image)).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Reads are public; every write goes through the auth middleware.
pub fn create_recipes_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let require_auth = || axum_middleware::from_fn_with_state(app_state.clone(), auth::auth);

    Router::new()
        .route(
            "/api/recipes/",
            get(get_recipes_handler).merge(post(create_recipe_handler).route_layer(require_auth())),
        )
        .route(
            "/api/recipes/{recipe_id}/",
            get(get_recipe_handler).merge(
                put(put_recipe_handler)
                    .merge(patch(patch_recipe_handler))
                    .merge(delete(delete_recipe_handler))
                    .route_layer(require_auth()),
            ),
        )
}
