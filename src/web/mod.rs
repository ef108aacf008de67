use axum::{
    extract::State,
    http::{HeaderValue, Method, header},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::services::media_service::{MEDIA_URL, MediaStore};
use crate::web::extract::AppJson;
use crate::web::models::LoginRequest;
use crate::web::routes::*;

pub use crate::web::error::AppError;

pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    pub media: Arc<dyn MediaStore>,
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let login_response = auth_service::login_user(&app_state.db_pool, payload, &app_state.config.jwt_secret).await?;

    let auth_cookie = Cookie::build(("token", login_response.auth_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();
    let cookie_value = HeaderValue::from_str(&auth_cookie.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Invalid auth cookie: {e}")))?;

    let mut response = Json(login_response).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie_value);
    Ok(response)
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(
    db_pool: DatabaseConnection,
    config: Arc<ServerConfig>,
    media: Arc<dyn MediaStore>,
) -> Router {
    let media_dir = config.media_dir.clone();
    let app_state = Arc::new(AppState {
        db_pool,
        config,
        media,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/auth/token/login/", post(login_handler))
        .merge(user_routes::create_users_router(app_state.clone()))
        .merge(recipe_routes::create_recipes_router(app_state.clone()))
        .merge(tag_routes::create_tags_router())
        .merge(ingredient_routes::create_ingredients_router())
        .nest_service(MEDIA_URL, ServeDir::new(media_dir))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::{ingredient, tag};
    use crate::db::services::recipe_service::tests::insert_tag;
    use crate::db::services::{get_ingredients, replace_all_ingredients};
    use crate::db::test_support::memory_db;
    use crate::services::media_service::FsMediaStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    struct TestApp {
        router: Router,
        db: DatabaseConnection,
        media_dir: TempDir,
        tags: Vec<tag::Model>,
        ingredients: Vec<ingredient::Model>,
    }

    async fn test_app() -> TestApp {
        let db = memory_db().await;
        let tags = vec![
            insert_tag(&db, "breakfast", "#E26C2D").await,
            insert_tag(&db, "dinner", "#49B64E").await,
        ];
        replace_all_ingredients(
            &db,
            vec![
                ("Salt".to_string(), "g".to_string()),
                ("Sugar".to_string(), "g".to_string()),
                ("Water".to_string(), "ml".to_string()),
            ],
        )
        .await
        .unwrap();
        let ingredients = get_ingredients(&db, None).await.unwrap();

        let media_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "http-test-secret".to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
            media_dir: media_dir.path().to_string_lossy().into_owned(),
            log_dir: "logs".to_string(),
            max_connections: 1,
        };
        let media: Arc<dyn MediaStore> = Arc::new(FsMediaStore::new(media_dir.path()));
        let router = create_axum_router(db.clone(), Arc::new(config), media);

        TestApp {
            router,
            db,
            media_dir,
            tags,
            ingredients,
        }
    }

    async fn send(
        app: &TestApp,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Registers `name` and returns `(user id, token)`.
    async fn sign_up(app: &TestApp, name: &str) -> (i64, String) {
        let (status, user) = send(
            app,
            Method::POST,
            "/api/users/",
            None,
            Some(json!({
                "email": format!("{name}@example.com"),
                "username": name,
                "first_name": "Test",
                "last_name": "User",
                "password": "correct horse battery",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, login) = send(
            app,
            Method::POST,
            "/api/auth/token/login/",
            None,
            Some(json!({ "email": format!("{name}@example.com"), "password": "correct horse battery" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (
            user["id"].as_i64().unwrap(),
            login["auth_token"].as_str().unwrap().to_string(),
        )
    }

    fn soup_payload(app: &TestApp, cooking_time: i32) -> Value {
        json!({
            "ingredients": [
                { "id": app.ingredients[0].id, "amount": 10 },
                { "id": app.ingredients[2].id, "amount": 500 },
            ],
            "tags": [app.tags[1].id],
            "image": PNG_DATA_URL,
            "name": "Soup",
            "text": "Boil the water, add salt.",
            "cooking_time": cooking_time,
        })
    }

    #[tokio::test]
    async fn test_health_and_public_reads() {
        let app = test_app().await;

        let (status, _) = send(&app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, tags) = send(&app, Method::GET, "/api/tags/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tags.as_array().unwrap().len(), 2);

        let (status, ingredients) = send(&app, Method::GET, "/api/ingredients/?name=Sa", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ingredients, json!([{ "id": app.ingredients[0].id, "name": "Salt", "measurement_unit": "g" }]));

        let (status, ingredients) = send(&app, Method::GET, "/api/ingredients/?name=%25", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ingredients, json!([]));

        let (status, _) = send(&app, Method::GET, "/api/tags/9999/", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, "/api/recipes/9999/", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = test_app().await;
        let (user_id, token) = sign_up(&app, "alice").await;

        let (status, me) = send(&app, Method::GET, "/api/users/me/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"].as_i64(), Some(user_id));
        assert_eq!(me["username"], "alice");
        assert!(me.get("password_hash").is_none());

        let (status, _) = send(&app, Method::GET, "/api/users/me/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, Method::GET, "/api/users/me/", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, errors) = send(
            &app,
            Method::POST,
            "/api/users/set_password/",
            Some(&token),
            Some(json!({ "current_password": "wrong", "new_password": "brand new secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors["current_password"].is_array());

        let (status, errors) =
            send(&app, Method::POST, "/api/users/", None, Some(json!({ "email": "x@example.com" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors["username"].is_array());

        // Same email again
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/users/",
            None,
            Some(json!({
                "email": "alice@example.com",
                "username": "alice2",
                "first_name": "A",
                "last_name": "B",
                "password": "another password",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_token_of_deleted_user_is_refused() {
        use crate::db::entities::prelude::User;
        use sea_orm::EntityTrait;

        let app = test_app().await;
        let (user_id, token) = sign_up(&app, "alice").await;
        let (status, _) = send(&app, Method::GET, "/api/users/me/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        User::delete_by_id(user_id as i32).exec(&app.db).await.unwrap();

        let (status, _) = send(&app, Method::GET, "/api/users/me/", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, Method::POST, "/api/recipes/", Some(&token), Some(soup_payload(&app, 5))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_recipe_lifecycle() {
        let app = test_app().await;
        let (alice_id, alice) = sign_up(&app, "alice").await;
        let (_, bob) = sign_up(&app, "bob").await;

        let (status, _) = send(&app, Method::POST, "/api/recipes/", None, Some(soup_payload(&app, 30))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, recipe) =
            send(&app, Method::POST, "/api/recipes/", Some(&alice), Some(soup_payload(&app, 30))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recipe["author"].as_i64(), Some(alice_id));
        assert_eq!(recipe["tags"][0]["slug"], "dinner");
        assert_eq!(recipe["ingredients"][0]["name"], "Salt");
        assert_eq!(recipe["ingredients"][0]["amount"], 10);
        assert_eq!(recipe["ingredients"][1]["measurement_unit"], "ml");
        assert_eq!(recipe["ingredients"][1]["amount"], 500);

        let image_url = recipe["image"].as_str().unwrap().to_string();
        let reference = image_url.strip_prefix("/media/").unwrap().to_string();
        assert!(reference.starts_with("recipes/images/"));
        assert!(app.media_dir.path().join(&reference).exists());

        let recipe_uri = format!("/api/recipes/{}/", recipe["id"]);
        let (status, listed) = send(&app, Method::GET, "/api/recipes/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0], recipe);

        // Someone else may read but not write.
        let (status, _) = send(
            &app,
            Method::PATCH,
            &recipe_uri,
            Some(&bob),
            Some(json!({ "name": "Stolen soup" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, Method::DELETE, &recipe_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, patched) = send(
            &app,
            Method::PATCH,
            &recipe_uri,
            Some(&alice),
            Some(json!({ "tags": [app.tags[0].id], "cooking_time": 15 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["cooking_time"], 15);
        assert_eq!(patched["tags"].as_array().unwrap().len(), 1);
        assert_eq!(patched["tags"][0]["slug"], "breakfast");
        assert_eq!(patched["ingredients"], recipe["ingredients"]);
        assert_eq!(patched["image"], recipe["image"]);

        // PUT needs the full payload.
        let (status, errors) = send(
            &app,
            Method::PUT,
            &recipe_uri,
            Some(&alice),
            Some(json!({ "name": "Only a name" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors.get("ingredients").is_some());
        assert!(errors.get("image").is_none());

        let (status, _) = send(&app, Method::DELETE, &recipe_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!app.media_dir.path().join(&reference).exists());
        let (status, _) = send(&app, Method::GET, &recipe_uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recipe_validation_errors() {
        let app = test_app().await;
        let (_, alice) = sign_up(&app, "alice").await;

        let (status, errors) =
            send(&app, Method::POST, "/api/recipes/", Some(&alice), Some(soup_payload(&app, 0))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors["cooking_time"].is_array());

        let mut payload = soup_payload(&app, 10);
        payload["ingredients"] = json!([{ "id": 9999, "amount": 1 }]);
        payload["image"] = json!("data:image/png;base64,***");
        let (status, errors) = send(&app, Method::POST, "/api/recipes/", Some(&alice), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors["image"].is_array());

        let mut payload = soup_payload(&app, 10);
        payload["ingredients"] = json!([{ "id": 9999, "amount": 1 }]);
        let (status, errors) = send(&app, Method::POST, "/api/recipes/", Some(&alice), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors["ingredients"].is_array());

        // Wrongly typed or incomplete bodies are field errors too.
        let mut payload = soup_payload(&app, 10);
        payload["cooking_time"] = json!("forty");
        let (status, errors) = send(&app, Method::POST, "/api/recipes/", Some(&alice), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors["cooking_time"][0].as_str().unwrap().contains("invalid type"));

        let mut payload = soup_payload(&app, 10);
        payload["ingredients"] = json!([{ "id": app.ingredients[0].id }]);
        let (status, errors) = send(&app, Method::POST, "/api/recipes/", Some(&alice), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors["ingredients"][0].as_str().unwrap().contains("amount"));

        let mut payload = soup_payload(&app, 10);
        payload["tags"] = json!([]);
        payload["image"] = json!("data:text/html;base64,PHNjcmlwdD5hbGVydCgxKTwvc2NyaXB0Pg==");
        let (status, errors) = send(&app, Method::POST, "/api/recipes/", Some(&alice), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors["tags"].is_array());
        assert!(errors["image"].is_array());

        let (status, errors) = send(
            &app,
            Method::GET,
            "/api/users/subscriptions/?recipes_limit=many",
            Some(&alice),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(errors.is_object());

        // The image stored for the rejected recipe is cleaned up again.
        let images = app.media_dir.path().join("recipes/images");
        let leftover = std::fs::read_dir(&images).map(|dir| dir.count()).unwrap_or(0);
        assert_eq!(leftover, 0);

        let (_, listed) = send(&app, Method::GET, "/api/recipes/", None, None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_subscriptions() {
        let app = test_app().await;
        let (alice_id, alice) = sign_up(&app, "alice").await;
        let (_, bob) = sign_up(&app, "bob").await;

        for _ in 0..2 {
            let (status, _) =
                send(&app, Method::POST, "/api/recipes/", Some(&alice), Some(soup_payload(&app, 20))).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let subscribe_uri = format!("/api/users/{alice_id}/subscribe/");
        let (status, card) = send(&app, Method::POST, &subscribe_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(card["username"], "alice");
        assert_eq!(card["is_subscribed"], true);
        assert_eq!(card["recipes_count"], 2);

        let (status, _) = send(&app, Method::POST, &subscribe_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::POST, &subscribe_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, Method::POST, "/api/users/9999/subscribe/", Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, cards) = send(
            &app,
            Method::GET,
            "/api/users/subscriptions/?recipes_limit=1",
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cards.as_array().unwrap().len(), 1);
        assert_eq!(cards[0]["recipes"].as_array().unwrap().len(), 1);
        assert_eq!(cards[0]["recipes_count"], 2);

        for _ in 0..2 {
            let (status, _) = send(&app, Method::DELETE, &subscribe_uri, Some(&bob), None).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }
        let (_, cards) = send(&app, Method::GET, "/api/users/subscriptions/", Some(&bob), None).await;
        assert_eq!(cards, json!([]));
    }
}
