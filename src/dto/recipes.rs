use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::users::UserDto, models::Tag};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct IngredientLineRequest {
    /// Ingredient id.
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientLineRequest>,
    pub tags: Vec<Uuid>,
}

/// Scalar fields fall back to the stored values when omitted; the ingredient
/// and tag sets are always replaced wholesale.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Vec<IngredientLineRequest>,
    pub tags: Vec<Uuid>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct IngredientLineDto {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeDto {
    pub id: Uuid,
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
    pub author: UserDto,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<IngredientLineDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeList {
    pub items: Vec<RecipeDto>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ShortRecipeDto {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}
