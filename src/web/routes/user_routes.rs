use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use sea_orm::DbConn;
use std::sync::Arc;

use crate::db::entities::user;
use crate::db::services::{self, RecipeService};
use crate::services::auth_service;
use crate::web::middleware::auth;
use crate::web::models::subscription_models::{SubscriptionQuery, SubscriptionResponse};
use crate::web::models::{AuthenticatedUser, RegisterRequest, SetPasswordRequest, UserResponse};
use crate::web::extract::{AppJson, AppQuery};
use crate::web::{AppError, AppState};

async fn get_users_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = services::get_all_users(&app_state.db_pool).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user_response = auth_service::register_user(&app_state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, Json(user_response)))
}

async fn get_user_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::get_user_by_id(&app_state.db_pool, user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(user.into()))
}

async fn set_password_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<SetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    auth_service::set_password(&app_state.db_pool, &authenticated_user, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Builds an author card with their newest recipes and total recipe count.
async fn author_card(
    db: &DbConn,
    author: user::Model,
    is_subscribed: bool,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionResponse, AppError> {
    let recipes = RecipeService::get_recipes_by_author(db, author.id, recipes_limit).await?;
    let recipes_count = RecipeService::count_recipes_by_author(db, author.id).await?;
    Ok(SubscriptionResponse::new(
        author,
        is_subscribed,
        recipes.into_iter().map(Into::into).collect(),
        recipes_count,
    ))
}

async fn get_subscriptions_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<SubscriptionQuery>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let db = &app_state.db_pool;
    let subscriptions = services::get_subscriptions(db, authenticated_user.id).await?;

    let mut cards = Vec::with_capacity(subscriptions.len());
    for (subscription, author) in subscriptions {
        let is_subscribed = subscription.subscriber_id == authenticated_user.id;
        cards.push(author_card(db, author, is_subscribed, query.recipes_limit).await?);
    }
    Ok(Json(cards))
}

async fn subscribe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(author_id): Path<i32>,
    AppQuery(query): AppQuery<SubscriptionQuery>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError> {
    let db = &app_state.db_pool;
    let author = services::subscribe(db, author_id, authenticated_user.id).await?;
    let is_subscribed = services::is_subscribed(db, author.id, authenticated_user.id).await?;
    let card = author_card(db, author, is_subscribed, query.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

async fn unsubscribe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(author_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::unsubscribe(&app_state.db_pool, author_id, authenticated_user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Listing, registration and profile reads are public; the rest needs a token.
pub fn create_users_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/api/users/me/", get(auth_service::me))
        .route("/api/users/set_password/", post(set_password_handler))
        .route("/api/users/subscriptions/", get(get_subscriptions_handler))
        .route(
            "/api/users/{user_id}/subscribe/",
            post(subscribe_handler).delete(unsubscribe_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state, auth::auth));

    Router::new()
        .route("/api/users/", get(get_users_handler).post(register_handler))
        .route("/api/users/{user_id}/", get(get_user_handler))
        .merge(protected)
}
