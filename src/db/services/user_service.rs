use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::entities::{prelude::User, user};

/// Fields needed to create an account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

pub async fn create_user(db: &DbConn, new_user: NewUser) -> Result<user::Model, DbErr> {
    user::ActiveModel {
        email: Set(new_user.email),
        username: Set(new_user.username),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        password_hash: Set(new_user.password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn get_all_users(db: &DbConn) -> Result<Vec<user::Model>, DbErr> {
    User::find().order_by_asc(user::Column::Id).all(db).await
}

pub async fn get_user_by_id(db: &DbConn, user_id: i32) -> Result<Option<user::Model>, DbErr> {
    User::find_by_id(user_id).one(db).await
}

pub async fn get_user_by_email(db: &DbConn, email: &str) -> Result<Option<user::Model>, DbErr> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

pub async fn get_user_by_username(db: &DbConn, username: &str) -> Result<Option<user::Model>, DbErr> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
}

pub async fn update_password_hash(
    db: &DbConn,
    user: user::Model,
    password_hash: String,
) -> Result<user::Model, DbErr> {
    let mut active_user: user::ActiveModel = user.into();
    active_user.password_hash = Set(password_hash);
    active_user.update(db).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::test_support::memory_db;

    /// Inserts a user whose username and email derive from `name`.
    pub(crate) async fn insert_user(db: &DbConn, name: &str) -> user::Model {
        create_user(
            db,
            NewUser {
                email: format!("{name}@example.com"),
                username: name.to_string(),
                first_name: name.to_uppercase(),
                last_name: "Tester".to_string(),
                password_hash: "not-a-real-hash".to_string(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = memory_db().await;
        let alice = insert_user(&db, "alice").await;

        let by_email = get_user_by_email(&db, "alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, alice.id);
        let by_name = get_user_by_username(&db, "alice").await.unwrap().unwrap();
        assert_eq!(by_name.email, "alice@example.com");
        assert!(get_user_by_id(&db, alice.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let db = memory_db().await;
        insert_user(&db, "bob").await;

        let err = create_user(
            &db,
            NewUser {
                email: "bob@example.com".to_string(),
                username: "bobby".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: "x".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(crate::db::services::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_update_password_hash() {
        let db = memory_db().await;
        let carol = insert_user(&db, "carol").await;

        let updated = update_password_hash(&db, carol, "new-hash".to_string()).await.unwrap();
        assert_eq!(updated.password_hash, "new-hash");
        assert_eq!(get_all_users(&db).await.unwrap().len(), 1);
    }
}
