use std::collections::HashSet;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::recipes::{
        CreateRecipeRequest, IngredientLineDto, IngredientLineRequest, RecipeDto, RecipeList,
        UpdateRecipeRequest,
    },
    dto::users::UserDto,
    entity::{
        ingredient_amounts::{ActiveModel as LineActive, Column as LineCol, Entity as Lines},
        ingredients::{Column as IngredientCol, Entity as Ingredients},
        recipe_tags::{ActiveModel as RecipeTagActive, Column as RecipeTagCol, Entity as RecipeTags},
        recipes::{ActiveModel as RecipeActive, Entity as Recipes, Model as RecipeModel},
        tags::{Column as TagCol, Entity as Tags},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_author_or_admin},
    models::{Recipe, Tag, User},
    response::{ApiResponse, Meta},
    routes::params::RecipeListQuery,
    services::{cart_service, favorite_service, follow_service},
    state::AppState,
    validate,
};

pub async fn create_recipe(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRecipeRequest,
) -> AppResult<ApiResponse<RecipeDto>> {
    validate::validate_cooking_time(payload.cooking_time)?;
    validate_ingredient_lines(&payload.ingredients)?;
    let tag_ids = dedupe_tags(&payload.tags);

    let txn = state.orm.begin().await?;

    resolve_references(&txn, &payload.ingredients, &tag_ids).await?;

    let recipe = RecipeActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        text: Set(payload.text),
        author_id: Set(user.user_id),
        image: Set(payload.image),
        cooking_time: Set(payload.cooking_time),
        pub_date: NotSet,
    }
    .insert(&txn)
    .await?;

    attach_lines_and_tags(&txn, recipe.id, &payload.ingredients, &tag_ids).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "recipe_create",
        Some("recipes"),
        Some(serde_json::json!({ "recipe_id": recipe.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let view = build_recipe_view(&state.pool, recipe_from_entity(recipe), Some(user)).await?;
    Ok(ApiResponse::success("Recipe created", view, Some(Meta::empty())))
}

pub async fn update_recipe(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRecipeRequest,
) -> AppResult<ApiResponse<RecipeDto>> {
    validate_ingredient_lines(&payload.ingredients)?;
    if let Some(cooking_time) = payload.cooking_time {
        validate::validate_cooking_time(cooking_time)?;
    }
    let tag_ids = dedupe_tags(&payload.tags);

    let txn = state.orm.begin().await?;

    let existing = Recipes::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    ensure_author_or_admin(user, existing.author_id)?;

    resolve_references(&txn, &payload.ingredients, &tag_ids).await?;

    // Author and pub_date stay as they were at creation.
    let mut active: RecipeActive = existing.clone().into();
    active.name = Set(payload.name.unwrap_or(existing.name));
    active.text = Set(payload.text.unwrap_or(existing.text));
    active.image = Set(payload.image.or(existing.image));
    active.cooking_time = Set(payload.cooking_time.unwrap_or(existing.cooking_time));
    let recipe = active.update(&txn).await?;

    // Replace-all semantics: the old line and tag sets are discarded and the
    // new ones committed in the same transaction, so no reader ever observes
    // a recipe with a partial ingredient set.
    Lines::delete_many()
        .filter(LineCol::RecipeId.eq(recipe.id))
        .exec(&txn)
        .await?;
    RecipeTags::delete_many()
        .filter(RecipeTagCol::RecipeId.eq(recipe.id))
        .exec(&txn)
        .await?;

    attach_lines_and_tags(&txn, recipe.id, &payload.ingredients, &tag_ids).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "recipe_update",
        Some("recipes"),
        Some(serde_json::json!({ "recipe_id": recipe.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let view = build_recipe_view(&state.pool, recipe_from_entity(recipe), Some(user)).await?;
    Ok(ApiResponse::success("Recipe updated", view, Some(Meta::empty())))
}

pub async fn delete_recipe(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let author_id: Option<(Uuid,)> =
        sqlx::query_as("SELECT author_id FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    let author_id = author_id.ok_or(AppError::NotFound)?.0;
    ensure_author_or_admin(user, author_id)?;

    // FK cascades clean up lines, tag links, favorites and cart entries.
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "recipe_delete",
        Some("recipes"),
        Some(serde_json::json!({ "recipe_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Recipe deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn get_recipe(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<RecipeDto>> {
    let recipe = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let view = build_recipe_view(&state.pool, recipe, viewer).await?;
    Ok(ApiResponse::success("OK", view, None))
}

pub async fn list_recipes(
    state: &AppState,
    viewer: Option<&AuthUser>,
    query: RecipeListQuery,
) -> AppResult<ApiResponse<RecipeList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let viewer_id = viewer.map(|u| u.user_id);
    let want_favorited = query.is_favorited.unwrap_or(false);
    let want_in_cart = query.is_in_shopping_cart.unwrap_or(false);

    let filter_sql = r#"
        WHERE ($1::uuid IS NULL OR r.author_id = $1)
          AND (NOT $2 OR EXISTS (
                SELECT 1 FROM favorites f
                WHERE f.recipe_id = r.id AND f.user_id = $3))
          AND (NOT $4 OR EXISTS (
                SELECT 1 FROM shopping_list sl
                WHERE sl.recipe_id = r.id AND sl.user_id = $3))
    "#;

    let recipes = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT r.* FROM recipes r {filter_sql} ORDER BY r.pub_date DESC LIMIT $5 OFFSET $6"
    ))
    .bind(query.author)
    .bind(want_favorited)
    .bind(viewer_id)
    .bind(want_in_cart)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM recipes r {filter_sql}"
    ))
    .bind(query.author)
    .bind(want_favorited)
    .bind(viewer_id)
    .bind(want_in_cart)
    .fetch_one(&state.pool)
    .await?;

    let mut items = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        items.push(build_recipe_view(&state.pool, recipe, viewer).await?);
    }

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", RecipeList { items }, Some(meta)))
}

/// Assemble the read view: author profile, tags, ingredient lines and the
/// viewer-relative membership flags.
pub async fn build_recipe_view(
    pool: &DbPool,
    recipe: Recipe,
    viewer: Option<&AuthUser>,
) -> AppResult<RecipeDto> {
    let author = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(recipe.author_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.*
        FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(recipe.id)
    .fetch_all(pool)
    .await?;

    let ingredients = sqlx::query_as::<_, IngredientLineDto>(
        r#"
        SELECT ia.ingredient_id AS id, i.name, i.measurement_unit, ia.amount
        FROM ingredient_amounts ia
        JOIN ingredients i ON i.id = ia.ingredient_id
        WHERE ia.recipe_id = $1
        ORDER BY i.name
        "#,
    )
    .bind(recipe.id)
    .fetch_all(pool)
    .await?;

    let (is_subscribed, is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            follow_service::is_subscribed(pool, viewer.user_id, author.id).await?,
            favorite_service::is_favorited(pool, viewer.user_id, recipe.id).await?,
            cart_service::in_shopping_cart(pool, viewer.user_id, recipe.id).await?,
        ),
        None => (false, false, false),
    };

    Ok(RecipeDto {
        id: recipe.id,
        name: recipe.name,
        text: recipe.text,
        image: recipe.image,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
        author: UserDto::from_user(author, is_subscribed),
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    })
}

/// Bounds plus the uniqueness invariant: a recipe cannot list the same
/// ingredient twice.
fn validate_ingredient_lines(lines: &[IngredientLineRequest]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for line in lines {
        validate::validate_ingredient_amount(line.amount)?;
        if !seen.insert(line.id) {
            return Err(AppError::BadRequest(format!(
                "ingredient {} is listed more than once",
                line.id
            )));
        }
    }
    Ok(())
}

fn dedupe_tags(tag_ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    tag_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Every referenced tag and ingredient must exist before any row is written.
async fn resolve_references(
    txn: &sea_orm::DatabaseTransaction,
    lines: &[IngredientLineRequest],
    tag_ids: &[Uuid],
) -> AppResult<()> {
    let tag_count = Tags::find()
        .filter(TagCol::Id.is_in(tag_ids.to_vec()))
        .count(txn)
        .await?;
    if tag_count != tag_ids.len() as u64 {
        return Err(AppError::NotFound);
    }

    let ingredient_ids: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
    let ingredient_count = Ingredients::find()
        .filter(IngredientCol::Id.is_in(ingredient_ids.clone()))
        .count(txn)
        .await?;
    if ingredient_count != ingredient_ids.len() as u64 {
        return Err(AppError::NotFound);
    }

    Ok(())
}

async fn attach_lines_and_tags(
    txn: &sea_orm::DatabaseTransaction,
    recipe_id: Uuid,
    lines: &[IngredientLineRequest],
    tag_ids: &[Uuid],
) -> AppResult<()> {
    for line in lines {
        LineActive {
            id: Set(Uuid::new_v4()),
            recipe_id: Set(recipe_id),
            ingredient_id: Set(line.id),
            amount: Set(line.amount),
        }
        .insert(txn)
        .await
        .map_err(|err| {
            AppError::conflict_on_unique_orm(err, "ingredient already attached to this recipe")
        })?;
    }

    for tag_id in tag_ids {
        RecipeTagActive {
            id: Set(Uuid::new_v4()),
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
        }
        .insert(txn)
        .await
        .map_err(|err| {
            AppError::conflict_on_unique_orm(err, "tag already attached to this recipe")
        })?;
    }

    Ok(())
}

fn recipe_from_entity(model: RecipeModel) -> Recipe {
    Recipe {
        id: model.id,
        name: model.name,
        text: model.text,
        author_id: model.author_id,
        image: model.image,
        cooking_time: model.cooking_time,
        pub_date: model.pub_date.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: Uuid, amount: i32) -> IngredientLineRequest {
        IngredientLineRequest { id, amount }
    }

    #[test]
    fn rejects_duplicate_ingredient_in_payload() {
        let id = Uuid::new_v4();
        let lines = vec![line(id, 10), line(Uuid::new_v4(), 5), line(id, 3)];
        assert!(matches!(
            validate_ingredient_lines(&lines),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_out_of_bound_amounts() {
        assert!(validate_ingredient_lines(&[line(Uuid::new_v4(), 0)]).is_err());
        assert!(validate_ingredient_lines(&[line(Uuid::new_v4(), 257)]).is_err());
        assert!(validate_ingredient_lines(&[line(Uuid::new_v4(), 1)]).is_ok());
        assert!(validate_ingredient_lines(&[line(Uuid::new_v4(), 256)]).is_ok());
    }

    #[test]
    fn tag_ids_are_deduplicated() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedupe_tags(&[a, b, a, a]), vec![a, b]);
    }
}
