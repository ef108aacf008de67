//! JSON representations of tags, ingredients and recipes.

use serde::{Deserialize, Serialize};

use crate::db::entities::{ingredient, recipe, tag};
use crate::db::services::{IngredientAmount, RecipeDetails, RecipeDraft, RecipeIngredient};
use crate::services::media_service::media_url;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(tag: tag::Model) -> Self {
        TagResponse {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(ingredient: ingredient::Model) -> Self {
        IngredientResponse {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

/// An ingredient as it appears inside a recipe.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeIngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredient> for RecipeIngredientResponse {
    fn from(entry: RecipeIngredient) -> Self {
        RecipeIngredientResponse {
            id: entry.ingredient.id,
            name: entry.ingredient.name,
            measurement_unit: entry.ingredient.measurement_unit,
            amount: entry.amount,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeResponse {
    pub id: i32,
    pub author: i32,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl From<RecipeDetails> for RecipeResponse {
    fn from(details: RecipeDetails) -> Self {
        let RecipeDetails {
            recipe,
            tags,
            ingredients,
        } = details;
        RecipeResponse {
            id: recipe.id,
            author: recipe.author_id,
            tags: tags.into_iter().map(Into::into).collect(),
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            name: recipe.name,
            image: media_url(&recipe.image),
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Short recipe form used inside subscription listings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortRecipeResponse {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<recipe::Model> for ShortRecipeResponse {
    fn from(recipe: recipe::Model) -> Self {
        ShortRecipeResponse {
            id: recipe.id,
            name: recipe.name,
            image: media_url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Body of recipe POST/PUT/PATCH. `image` is base64, optionally a data URL.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeWriteRequest {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

impl RecipeWriteRequest {
    /// Splits off the encoded image; the draft's image is filled in once stored.
    pub fn into_draft(self) -> (RecipeDraft, Option<String>) {
        let draft = RecipeDraft {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image: None,
            tags: self.tags,
            ingredients: self.ingredients,
        };
        (draft, self.image)
    }
}
