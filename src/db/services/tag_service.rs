use sea_orm::{DbConn, DbErr, EntityTrait, QueryOrder};

use crate::db::entities::{prelude::Tag, tag};

/// All tags, alphabetically.
pub async fn get_all_tags(db: &DbConn) -> Result<Vec<tag::Model>, DbErr> {
    Tag::find().order_by_asc(tag::Column::Name).all(db).await
}

pub async fn get_tag_by_id(db: &DbConn, tag_id: i32) -> Result<Option<tag::Model>, DbErr> {
    Tag::find_by_id(tag_id).one(db).await
}
