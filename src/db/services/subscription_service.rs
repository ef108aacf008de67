use sea_orm::{
    ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::db::entities::{
    prelude::{Subscription, User},
    subscription, user,
};
use crate::db::services::is_unique_violation;

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("User not found: {0}")]
    AuthorNotFound(i32),
    #[error("You cannot subscribe to yourself.")]
    SelfSubscription,
    #[error("You are already subscribed to user {0}.")]
    AlreadySubscribed(i32),
}

/// Subscribes `subscriber_id` to `author_id` and returns the author.
pub async fn subscribe(
    db: &DbConn,
    author_id: i32,
    subscriber_id: i32,
) -> Result<user::Model, SubscriptionError> {
    let author = User::find_by_id(author_id)
        .one(db)
        .await?
        .ok_or(SubscriptionError::AuthorNotFound(author_id))?;

    if author_id == subscriber_id {
        return Err(SubscriptionError::SelfSubscription);
    }

    if Subscription::find_by_id((author_id, subscriber_id))
        .one(db)
        .await?
        .is_some()
    {
        return Err(SubscriptionError::AlreadySubscribed(author_id));
    }

    let row = subscription::ActiveModel {
        author_id: Set(author_id),
        subscriber_id: Set(subscriber_id),
    };
    // The composite key still guards against a concurrent duplicate.
    Subscription::insert(row)
        .exec_without_returning(db)
        .await
        .map_err(|db_err| {
            if is_unique_violation(&db_err) {
                SubscriptionError::AlreadySubscribed(author_id)
            } else {
                SubscriptionError::DbErr(db_err)
            }
        })?;

    info!(author_id, subscriber_id, "Subscription created.");
    Ok(author)
}

/// Removes the subscription if there is one. Returns how many rows went away.
pub async fn unsubscribe(
    db: &DbConn,
    author_id: i32,
    subscriber_id: i32,
) -> Result<u64, SubscriptionError> {
    if User::find_by_id(author_id).one(db).await?.is_none() {
        return Err(SubscriptionError::AuthorNotFound(author_id));
    }

    let rows_affected = Subscription::delete_many()
        .filter(subscription::Column::AuthorId.eq(author_id))
        .filter(subscription::Column::SubscriberId.eq(subscriber_id))
        .exec(db)
        .await?
        .rows_affected;
    if rows_affected > 0 {
        info!(author_id, subscriber_id, "Subscription removed.");
    }
    Ok(rows_affected)
}

/// Every author `subscriber_id` follows, paired with the subscription row.
pub async fn get_subscriptions(
    db: &DbConn,
    subscriber_id: i32,
) -> Result<Vec<(subscription::Model, user::Model)>, DbErr> {
    let rows = Subscription::find()
        .filter(subscription::Column::SubscriberId.eq(subscriber_id))
        .all(db)
        .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let authors = User::find()
        .filter(user::Column::Id.is_in(rows.iter().map(|row| row.author_id)))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;

    Ok(authors
        .into_iter()
        .filter_map(|author| {
            rows.iter()
                .find(|row| row.author_id == author.id)
                .map(|row| (row.clone(), author))
        })
        .collect())
}

pub async fn is_subscribed(db: &DbConn, author_id: i32, subscriber_id: i32) -> Result<bool, DbErr> {
    Ok(Subscription::find_by_id((author_id, subscriber_id))
        .one(db)
        .await?
        .is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::user_service::tests::insert_user;
    use crate::db::test_support::memory_db;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_subscribe_and_list() {
        let db = memory_db().await;
        let reader = insert_user(&db, "reader").await;
        let chef = insert_user(&db, "chef").await;
        let baker = insert_user(&db, "baker").await;

        let author = subscribe(&db, chef.id, reader.id).await.unwrap();
        assert_eq!(author.id, chef.id);
        subscribe(&db, baker.id, reader.id).await.unwrap();

        let subscriptions = get_subscriptions(&db, reader.id).await.unwrap();
        let authors: Vec<_> = subscriptions.iter().map(|(_, a)| a.username.as_str()).collect();
        assert_eq!(authors, ["chef", "baker"]);
        assert!(subscriptions.iter().all(|(row, _)| row.subscriber_id == reader.id));

        assert!(is_subscribed(&db, chef.id, reader.id).await.unwrap());
        assert!(!is_subscribed(&db, reader.id, chef.id).await.unwrap());
        assert!(get_subscriptions(&db, chef.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_subscription_fails() {
        let db = memory_db().await;
        let reader = insert_user(&db, "reader").await;
        let chef = insert_user(&db, "chef").await;

        subscribe(&db, chef.id, reader.id).await.unwrap();
        assert!(matches!(
            subscribe(&db, chef.id, reader.id).await,
            Err(SubscriptionError::AlreadySubscribed(id)) if id == chef.id
        ));
        assert_eq!(Subscription::find().count(&db).await.unwrap(), 1);

        // The key itself rejects a second row too.
        let err = Subscription::insert(subscription::ActiveModel {
            author_id: Set(chef.id),
            subscriber_id: Set(reader.id),
        })
        .exec_without_returning(&db)
        .await
        .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_self_and_unknown_author() {
        let db = memory_db().await;
        let reader = insert_user(&db, "reader").await;

        assert!(matches!(
            subscribe(&db, reader.id, reader.id).await,
            Err(SubscriptionError::SelfSubscription)
        ));
        assert!(matches!(
            subscribe(&db, 4242, reader.id).await,
            Err(SubscriptionError::AuthorNotFound(4242))
        ));
        assert!(matches!(
            unsubscribe(&db, 4242, reader.id).await,
            Err(SubscriptionError::AuthorNotFound(4242))
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let db = memory_db().await;
        let reader = insert_user(&db, "reader").await;
        let chef = insert_user(&db, "chef").await;

        assert_eq!(unsubscribe(&db, chef.id, reader.id).await.unwrap(), 0);

        subscribe(&db, chef.id, reader.id).await.unwrap();
        assert_eq!(unsubscribe(&db, chef.id, reader.id).await.unwrap(), 1);
        assert_eq!(unsubscribe(&db, chef.id, reader.id).await.unwrap(), 0);
        assert!(!is_subscribed(&db, chef.id, reader.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleting_either_user_removes_subscriptions() {
        use sea_orm::ModelTrait;

        let db = memory_db().await;
        let reader = insert_user(&db, "reader").await;
        let chef = insert_user(&db, "chef").await;
        let baker = insert_user(&db, "baker").await;

        subscribe(&db, chef.id, reader.id).await.unwrap();
        subscribe(&db, baker.id, reader.id).await.unwrap();
        subscribe(&db, reader.id, chef.id).await.unwrap();
        assert_eq!(Subscription::find().count(&db).await.unwrap(), 3);

        // Deleting an author drops the rows pointing at them.
        let baker_id = baker.id;
        baker.delete(&db).await.unwrap();
        assert_eq!(Subscription::find().count(&db).await.unwrap(), 2);
        assert!(!is_subscribed(&db, baker_id, reader.id).await.unwrap());

        // Deleting a subscriber drops the rows they created, and as an author too.
        reader.delete(&db).await.unwrap();
        assert_eq!(Subscription::find().count(&db).await.unwrap(), 0);
        assert!(get_subscriptions(&db, chef.id).await.unwrap().is_empty());
    }
}
