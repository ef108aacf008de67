use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::db::entities::user;
use crate::db::services::{self, NewUser, is_unique_violation};
use crate::validation::{FieldErrors, Validate};
use crate::web::AppState;
use crate::web::error::AppError;
use crate::web::models::{
    AuthenticatedUser, Claims, LoginRequest, LoginResponse, MIN_PASSWORD_LEN, RegisterRequest,
    SetPasswordRequest, UserResponse,
};

const TOKEN_TTL_HOURS: i64 = 24;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

pub async fn register_user(pool: &DatabaseConnection, req: RegisterRequest) -> Result<UserResponse, AppError> {
    req.validate()?;
    let email = req.email.trim().to_lowercase();

    if services::get_user_by_email(pool, &email).await?.is_some() {
        return Err(AppError::UserAlreadyExists("A user with this email already exists.".to_string()));
    }
    if services::get_user_by_username(pool, &req.username).await?.is_some() {
        return Err(AppError::UserAlreadyExists("A user with this username already exists.".to_string()));
    }

    let password_hash = hash(&req.password, HASH_COST)
        .map_err(|e| AppError::PasswordHashingError(e.to_string()))?;

    let new_user = NewUser {
        email,
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        password_hash,
    };
    let user_model = services::create_user(pool, new_user).await.map_err(|db_err| {
        if is_unique_violation(&db_err) {
            AppError::UserAlreadyExists("A user with this email or username already exists.".to_string())
        } else {
            AppError::DatabaseError(db_err.to_string())
        }
    })?;

    info!(user_id = user_model.id, "User registered.");
    Ok(user_model.into())
}

pub async fn login_user(pool: &DatabaseConnection, req: LoginRequest, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput("Email and password are required.".to_string()));
    }

    let user = services::get_user_by_email(pool, &req.email.trim().to_lowercase())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid_password {
        warn!(user_id = user.id, "Login attempt with a wrong password.");
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user, jwt_secret)
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    let expiration = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiration,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_ref()))
        .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(LoginResponse { auth_token: token })
}

pub async fn set_password(
    pool: &DatabaseConnection,
    auth_user: &AuthenticatedUser,
    req: SetPasswordRequest,
) -> Result<(), AppError> {
    let user = services::get_user_by_id(pool, auth_user.id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let valid_password = verify(&req.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    let mut errors = FieldErrors::new();
    if !valid_password {
        errors.add("current_password", "Current password is incorrect.");
    }
    if req.new_password.len() < MIN_PASSWORD_LEN {
        errors.add(
            "new_password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long."),
        );
    }
    errors.into_result()?;

    let password_hash = hash(&req.new_password, HASH_COST)
        .map_err(|e| AppError::PasswordHashingError(e.to_string()))?;
    services::update_password_hash(pool, user, password_hash).await?;
    info!(user_id = auth_user.id, "Password changed.");
    Ok(())
}

pub async fn me(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::get_user_by_id(&app_state.db_pool, user.id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(user.into()))
}
