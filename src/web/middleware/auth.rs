use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::services;
use crate::web::models::{AuthenticatedUser, Claims};
use crate::web::{AppState, error::AppError};

const TOKEN_COOKIE: &str = "token";

/// `Authorization: Token <jwt>` or `Bearer <jwt>`, else the `token` cookie.
fn request_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Token ").or_else(|| value.strip_prefix("Bearer ")))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match from_header {
        Some(token) => Some(token.to_string()),
        None => jar.get(TOKEN_COOKIE).map(|cookie| cookie.value().to_string()),
    }
}

/// Resolves a token to the account it was issued for. Tokens of deleted
/// accounts are refused even before they expire.
async fn authenticate(state: &AppState, token: &str) -> Result<AuthenticatedUser, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        debug!(error = %e, "Rejected token.");
        AppError::InvalidCredentials
    })?
    .claims;

    let user = services::get_user_by_id(&state.db_pool, claims.user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = claims.user_id, "Token refers to a user that no longer exists.");
            AppError::InvalidCredentials
        })?;

    Ok(AuthenticatedUser {
        id: user.id,
        email: user.email,
    })
}

/// Lets the request through only for a known user, exposed to handlers as
/// an `AuthenticatedUser` extension.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request_token(req.headers(), &jar).ok_or(AppError::InvalidCredentials)?;
    let authenticated_user = authenticate(&state, &token).await?;
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}
