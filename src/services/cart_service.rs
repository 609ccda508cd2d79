use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::{recipes::ShortRecipeDto, shopping::ShoppingListLine},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
};

pub async fn in_shopping_cart(pool: &DbPool, user_id: Uuid, recipe_id: Uuid) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM shopping_list WHERE user_id = $1 AND recipe_id = $2)",
    )
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<ShortRecipeDto>> {
    let recipe = sqlx::query_as::<_, ShortRecipeDto>(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1",
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    if in_shopping_cart(pool, user.user_id, recipe_id).await? {
        return Err(AppError::Conflict(
            "Recipe is already in the shopping cart".to_string(),
        ));
    }

    sqlx::query("INSERT INTO shopping_list (id, user_id, recipe_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|err| {
            AppError::conflict_on_unique(err, "Recipe is already in the shopping cart")
        })?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_add",
        Some("shopping_list"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Added to shopping cart",
        recipe,
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM shopping_list WHERE user_id = $1 AND recipe_id = $2")
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_remove",
        Some("shopping_list"),
        Some(serde_json::json!({ "recipe_id": recipe_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from shopping cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Sum ingredient amounts across every recipe in the user's cart, grouped by
/// ingredient identity. The cart's unique (user, recipe) index means no
/// recipe can contribute twice. Ordered by name so the rendered file is
/// deterministic.
pub async fn build_shopping_list(
    pool: &DbPool,
    user_id: Uuid,
) -> AppResult<Vec<ShoppingListLine>> {
    let lines = sqlx::query_as::<_, ShoppingListLine>(
        r#"
        SELECT i.name, SUM(ia.amount)::bigint AS total, i.measurement_unit
        FROM shopping_list sl
        JOIN ingredient_amounts ia ON ia.recipe_id = sl.recipe_id
        JOIN ingredients i ON i.id = ia.ingredient_id
        WHERE sl.user_id = $1
        GROUP BY i.id, i.name, i.measurement_unit
        ORDER BY i.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(lines)
}

/// Plain-text rendering: one `"<name>, <total> <unit>"` line per ingredient,
/// no trailing metadata.
pub fn render_shopping_list(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{}, {} {}", line.name, line.total, line.measurement_unit))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, total: i64, unit: &str) -> ShoppingListLine {
        ShoppingListLine {
            name: name.to_string(),
            total,
            measurement_unit: unit.to_string(),
        }
    }

    #[test]
    fn renders_one_line_per_ingredient() {
        let lines = vec![line("Egg", 2, "pcs"), line("Flour", 300, "g")];
        assert_eq!(render_shopping_list(&lines), "Egg, 2 pcs\nFlour, 300 g");
    }

    #[test]
    fn empty_cart_renders_empty_file() {
        assert_eq!(render_shopping_list(&[]), "");
    }
}
