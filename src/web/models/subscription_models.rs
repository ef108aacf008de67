use serde::{Deserialize, Serialize};

use crate::db::entities::user;
use crate::web::models::recipe_models::ShortRecipeResponse;

/// An author as seen by one of their subscribers.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<ShortRecipeResponse>,
    pub recipes_count: u64,
}

impl SubscriptionResponse {
    pub fn new(
        author: user::Model,
        is_subscribed: bool,
        recipes: Vec<ShortRecipeResponse>,
        recipes_count: u64,
    ) -> Self {
        SubscriptionResponse {
            email: author.email,
            id: author.id,
            username: author.username,
            first_name: author.first_name,
            last_name: author.last_name,
            is_subscribed,
            recipes,
            recipes_count,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    pub recipes_limit: Option<u64>,
}
