use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::db::entities::{
    ingredient, ingredient_recipe,
    prelude::{Ingredient, IngredientRecipe, Recipe, RecipeTag, Tag},
    recipe, recipe_tag, tag,
};
use crate::validation::{FieldErrors, Validate};

pub const MAX_RECIPE_NAME_LEN: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Recipe not found: {0}")]
    NotFound(i32),
    #[error("Only the author may modify recipe {0}")]
    Forbidden(i32),
    #[error("Invalid recipe: {0}")]
    Validation(FieldErrors),
}

impl From<FieldErrors> for RecipeError {
    fn from(errors: FieldErrors) -> Self {
        RecipeError::Validation(errors)
    }
}

/// One `{id, amount}` entry of a recipe write payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

/// Recipe fields as submitted by a client. `None` leaves a field untouched on
/// update; `image` is the already stored media reference.
#[derive(Debug, Clone, Default)]
pub struct RecipeDraft {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

impl RecipeDraft {
    /// Errors for every field a full write must carry.
    pub fn missing_fields(&self, require_image: bool) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let required = [
            ("name", self.name.is_none()),
            ("text", self.text.is_none()),
            ("cooking_time", self.cooking_time.is_none()),
            ("tags", self.tags.is_none()),
            ("ingredients", self.ingredients.is_none()),
            ("image", require_image && self.image.is_none()),
        ];
        for (field, missing) in required {
            if missing {
                errors.add(field, "This field is required.");
            }
        }
        errors
    }
}

impl Validate for RecipeDraft {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.add("name", "This field may not be blank.");
            } else if name.chars().count() > MAX_RECIPE_NAME_LEN {
                errors.add(
                    "name",
                    format!("Ensure this field has no more than {MAX_RECIPE_NAME_LEN} characters."),
                );
            }
        }
        if let Some(text) = &self.text {
            if text.trim().is_empty() {
                errors.add("text", "This field may not be blank.");
            }
        }
        if let Some(cooking_time) = self.cooking_time {
            if cooking_time < 1 {
                errors.add("cooking_time", "Cooking time must be at least 1 minute.");
            }
        }
        if let Some(tags) = &self.tags {
            if tags.is_empty() {
                errors.add("tags", "A recipe needs at least one tag.");
            }
            let mut seen = HashSet::new();
            for id in tags {
                if !seen.insert(*id) {
                    errors.add("tags", format!("Tag {id} is listed more than once."));
                }
            }
        }
        if let Some(ingredients) = &self.ingredients {
            if ingredients.is_empty() {
                errors.add("ingredients", "A recipe needs at least one ingredient.");
            }
            let mut seen = HashSet::new();
            for entry in ingredients {
                if entry.amount < 1 {
                    errors.add(
                        "ingredients",
                        format!("Amount of ingredient {} must be at least 1.", entry.id),
                    );
                }
                if !seen.insert(entry.id) {
                    errors.add(
                        "ingredients",
                        format!("Ingredient {} is listed more than once.", entry.id),
                    );
                }
            }
        }

        errors.into_result()
    }
}

/// An ingredient of a recipe together with the amount used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredient {
    pub ingredient: ingredient::Model,
    pub amount: i32,
}

/// A recipe with its tags and ingredients expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDetails {
    pub recipe: recipe::Model,
    pub tags: Vec<tag::Model>,
    pub ingredients: Vec<RecipeIngredient>,
}

/// Result of an update; `replaced_image` is the reference the new image superseded.
#[derive(Debug)]
pub struct RecipeUpdate {
    pub details: RecipeDetails,
    pub replaced_image: Option<String>,
}

pub struct RecipeService;

impl RecipeService {
    /// All recipes, newest first.
    pub async fn get_recipes(db: &DbConn) -> Result<Vec<RecipeDetails>, RecipeError> {
        let recipes = Recipe::find()
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .all(db)
            .await?;
        Ok(load_details(db, recipes).await?)
    }

    pub async fn get_recipe_by_id(db: &DbConn, recipe_id: i32) -> Result<RecipeDetails, RecipeError> {
        let recipe = Recipe::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or(RecipeError::NotFound(recipe_id))?;
        let mut details = load_details(db, vec![recipe]).await?;
        details.pop().ok_or(RecipeError::NotFound(recipe_id))
    }

    /// Creates a recipe authored by `author_id`. The draft must be complete.
    pub async fn create_recipe(
        db: &DbConn,
        author_id: i32,
        draft: RecipeDraft,
    ) -> Result<RecipeDetails, RecipeError> {
        draft.validate()?;
        let missing = draft.missing_fields(true);

        let RecipeDraft {
            name: Some(name),
            text: Some(text),
            cooking_time: Some(cooking_time),
            image: Some(image),
            tags: Some(tags),
            ingredients: Some(ingredients),
        } = draft
        else {
            return Err(RecipeError::Validation(missing));
        };

        let txn = db.begin().await?;
        check_references(&txn, Some(tags.as_slice()), Some(ingredients.as_slice())).await?;

        let recipe = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(name),
            image: Set(image),
            text: Set(text),
            cooking_time: Set(cooking_time),
            pub_date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        replace_tags(&txn, recipe.id, &tags).await?;
        replace_ingredients(&txn, recipe.id, &ingredients).await?;
        txn.commit().await?;

        info!(recipe_id = recipe.id, author_id, "Recipe created.");
        Self::get_recipe_by_id(db, recipe.id).await
    }

    /// Applies the fields present in `draft`. Tags and ingredients, when
    /// given, replace the previous sets entirely. Everything happens in one
    /// transaction.
    pub async fn update_recipe(
        db: &DbConn,
        recipe_id: i32,
        user_id: i32,
        draft: RecipeDraft,
    ) -> Result<RecipeUpdate, RecipeError> {
        draft.validate()?;

        let txn = db.begin().await?;
        let existing = Recipe::find_by_id(recipe_id)
            .one(&txn)
            .await?
            .ok_or(RecipeError::NotFound(recipe_id))?;
        if existing.author_id != user_id {
            return Err(RecipeError::Forbidden(recipe_id));
        }
        check_references(&txn, draft.tags.as_deref(), draft.ingredients.as_deref()).await?;

        let previous_image = existing.image.clone();
        let mut active_recipe: recipe::ActiveModel = existing.into();
        if let Some(name) = draft.name {
            active_recipe.name = Set(name);
        }
        if let Some(text) = draft.text {
            active_recipe.text = Set(text);
        }
        if let Some(cooking_time) = draft.cooking_time {
            active_recipe.cooking_time = Set(cooking_time);
        }
        let replaced_image = match draft.image {
            Some(image) => {
                active_recipe.image = Set(image);
                Some(previous_image)
            }
            None => None,
        };
        if active_recipe.is_changed() {
            active_recipe.update(&txn).await?;
        }

        if let Some(tags) = &draft.tags {
            replace_tags(&txn, recipe_id, tags).await?;
        }
        if let Some(ingredients) = &draft.ingredients {
            replace_ingredients(&txn, recipe_id, ingredients).await?;
        }
        txn.commit().await?;

        info!(recipe_id, user_id, "Recipe updated.");
        let details = Self::get_recipe_by_id(db, recipe_id).await?;
        Ok(RecipeUpdate {
            details,
            replaced_image,
        })
    }

    /// Deletes a recipe and its join rows; returns the image reference it used.
    pub async fn delete_recipe(db: &DbConn, recipe_id: i32, user_id: i32) -> Result<String, RecipeError> {
        let txn = db.begin().await?;
        let recipe = Recipe::find_by_id(recipe_id)
            .one(&txn)
            .await?
            .ok_or(RecipeError::NotFound(recipe_id))?;
        if recipe.author_id != user_id {
            return Err(RecipeError::Forbidden(recipe_id));
        }

        RecipeTag::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        IngredientRecipe::delete_many()
            .filter(ingredient_recipe::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        let image = recipe.image.clone();
        recipe.delete(&txn).await?;
        txn.commit().await?;

        info!(recipe_id, user_id, "Recipe deleted.");
        Ok(image)
    }

    /// An author's newest recipes, at most `limit` of them.
    pub async fn get_recipes_by_author(
        db: &DbConn,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<recipe::Model>, DbErr> {
        let mut query = Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        query.all(db).await
    }

    pub async fn count_recipes_by_author(db: &DbConn, author_id: i32) -> Result<u64, DbErr> {
        Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .count(db)
            .await
    }
}

/// Fails with field errors naming every tag or ingredient id that does not exist.
async fn check_references<C: ConnectionTrait>(
    conn: &C,
    tag_ids: Option<&[i32]>,
    ingredients: Option<&[IngredientAmount]>,
) -> Result<(), RecipeError> {
    let mut errors = FieldErrors::new();

    if let Some(tag_ids) = tag_ids.filter(|ids| !ids.is_empty()) {
        let found: HashSet<i32> = Tag::find()
            .select_only()
            .column(tag::Column::Id)
            .filter(tag::Column::Id.is_in(tag_ids.iter().copied()))
            .into_tuple::<i32>()
            .all(conn)
            .await?
            .into_iter()
            .collect();
        for id in tag_ids.iter().filter(|id| !found.contains(*id)) {
            errors.add("tags", format!("Tag {id} does not exist."));
        }
    }

    if let Some(ingredients) = ingredients.filter(|entries| !entries.is_empty()) {
        let found: HashSet<i32> = Ingredient::find()
            .select_only()
            .column(ingredient::Column::Id)
            .filter(ingredient::Column::Id.is_in(ingredients.iter().map(|entry| entry.id)))
            .into_tuple::<i32>()
            .all(conn)
            .await?
            .into_iter()
            .collect();
        for entry in ingredients.iter().filter(|entry| !found.contains(&entry.id)) {
            errors.add("ingredients", format!("Ingredient {} does not exist.", entry.id));
        }
    }

    Ok(errors.into_result()?)
}

async fn replace_tags<C: ConnectionTrait>(conn: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<(), DbErr> {
    RecipeTag::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;
    if tag_ids.is_empty() {
        return Ok(());
    }

    let rows = tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    });
    RecipeTag::insert_many(rows).exec_without_returning(conn).await?;
    debug!(recipe_id, count = tag_ids.len(), "Recipe tags replaced.");
    Ok(())
}

async fn replace_ingredients<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    ingredients: &[IngredientAmount],
) -> Result<(), DbErr> {
    IngredientRecipe::delete_many()
        .filter(ingredient_recipe::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;
    if ingredients.is_empty() {
        return Ok(());
    }

    let rows = ingredients.iter().map(|entry| ingredient_recipe::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(entry.id),
        amount: Set(entry.amount),
    });
    IngredientRecipe::insert_many(rows).exec_without_returning(conn).await?;
    debug!(recipe_id, count = ingredients.len(), "Recipe ingredients replaced.");
    Ok(())
}

/// Expands tags and ingredients for a batch of recipes, keeping their order.
async fn load_details<C: ConnectionTrait>(
    conn: &C,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeDetails>, DbErr> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

    let mut tags_by_recipe: HashMap<i32, Vec<tag::Model>> = HashMap::new();
    let tag_rows = RecipeTag::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
        .find_also_related(Tag)
        .order_by_asc(tag::Column::Name)
        .all(conn)
        .await?;
    for (link, tag) in tag_rows {
        if let Some(tag) = tag {
            tags_by_recipe.entry(link.recipe_id).or_default().push(tag);
        }
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredient>> = HashMap::new();
    let ingredient_rows = IngredientRecipe::find()
        .filter(ingredient_recipe::Column::RecipeId.is_in(recipe_ids))
        .find_also_related(Ingredient)
        .order_by_asc(ingredient::Column::Name)
        .all(conn)
        .await?;
    for (link, ingredient) in ingredient_rows {
        if let Some(ingredient) = ingredient {
            ingredients_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(RecipeIngredient {
                    ingredient,
                    amount: link.amount,
                });
        }
    }

    Ok(recipes
        .into_iter()
        .map(|recipe| RecipeDetails {
            tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
            ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
            recipe,
        })
        .collect())
}
