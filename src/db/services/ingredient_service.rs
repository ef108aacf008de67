use sea_orm::{
    ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::LikeExpr,
};
use tracing::info;

use crate::db::entities::{
    ingredient,
    prelude::{Ingredient, IngredientRecipe},
};

/// Ingredients ordered by name, optionally narrowed to a name prefix.
pub async fn get_ingredients(
    db: &DbConn,
    name_prefix: Option<&str>,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let mut query = Ingredient::find();
    if let Some(prefix) = name_prefix.filter(|p| !p.is_empty()) {
        let pattern = LikeExpr::new(format!("{}%", escape_like(prefix))).escape('\\');
        query = query.filter(ingredient::Column::Name.like(pattern));
    }
    query
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await
}

/// `%` and `_` in user input match themselves, not any text.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub async fn get_ingredient_by_id(
    db: &DbConn,
    ingredient_id: i32,
) -> Result<Option<ingredient::Model>, DbErr> {
    Ingredient::find_by_id(ingredient_id).one(db).await
}

/// Wipes every ingredient (and the recipe rows using them) and loads `rows`
/// as `(name, measurement_unit)` pairs. Runs in one transaction.
pub async fn replace_all_ingredients(
    db: &DbConn,
    rows: Vec<(String, String)>,
) -> Result<u64, DbErr> {
    let txn = db.begin().await?;

    // Explicit so it does not depend on the backend enforcing the cascade.
    IngredientRecipe::delete_many().exec(&txn).await?;
    let removed = Ingredient::delete_many().exec(&txn).await?.rows_affected;
    if removed > 0 {
        info!(removed, "Removed existing ingredients.");
    }

    let mut inserted = 0;
    for (name, measurement_unit) in rows {
        info!(name = %name, unit = %measurement_unit, "Ingredient added.");
        let row = ingredient::ActiveModel {
            name: Set(name),
            measurement_unit: Set(measurement_unit),
            ..Default::default()
        };
        Ingredient::insert(row).exec(&txn).await?;
        inserted += 1;
    }

    txn.commit().await?;
    Ok(inserted)
}
