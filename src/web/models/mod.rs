use serde::{Deserialize, Serialize};

use crate::db::entities::user;
use crate::validation::{FieldErrors, Validate};

pub mod recipe_models;
pub mod subscription_models;

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "This field may not be blank.");
        } else if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            errors.add("email", "Enter a valid email address.");
        }
        if self.username.trim().is_empty() {
            errors.add("username", "This field may not be blank.");
        } else if self.username.chars().count() > MAX_USERNAME_LEN {
            errors.add(
                "username",
                format!("Ensure this field has no more than {MAX_USERNAME_LEN} characters."),
            );
        }
        if self.first_name.trim().is_empty() {
            errors.add("first_name", "This field may not be blank.");
        }
        if self.last_name.trim().is_empty() {
            errors.add("last_name", "This field may not be blank.");
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters long."),
            );
        }
        errors.into_result()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        UserResponse {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub auth_token: String,
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // email
    pub user_id: i32,
    pub exp: usize,
}

/// Struct to hold authenticated user details, to be passed as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
}
