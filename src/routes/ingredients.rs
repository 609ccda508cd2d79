use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Ingredient,
    response::{ApiResponse, Meta},
    routes::params::IngredientQuery,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(serde::Serialize, ToSchema)]
pub struct IngredientList {
    pub items: Vec<Ingredient>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients).post(create_ingredient))
        .route("/{id}", get(get_ingredient))
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(
        ("q" = Option<String>, Query, description = "Name prefix filter")
    ),
    responses(
        (status = 200, description = "List ingredients ordered by name", body = ApiResponse<IngredientList>)
    ),
    tag = "Ingredients"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<ApiResponse<IngredientList>>> {
    let items = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT * FROM ingredients
        WHERE ($1::text IS NULL OR name ILIKE $1 || '%')
        ORDER BY name
        "#,
    )
    .bind(query.q.as_deref().map(escape_like_prefix))
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Ingredients",
        IngredientList { items },
        None,
    )))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(
        ("id" = Uuid, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Get ingredient", body = ApiResponse<Ingredient>),
        (status = 404, description = "Ingredient not found"),
    ),
    tag = "Ingredients"
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Ingredient>>> {
    let ingredient = sqlx::query_as::<_, Ingredient>("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let ingredient = match ingredient {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };
    Ok(Json(ApiResponse::success("Ingredient", ingredient, None)))
}

// `q` is a literal prefix; LIKE metacharacters in it must not act as
// wildcards, so they are escaped before the pattern is assembled.
fn escape_like_prefix(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient created", body = ApiResponse<Ingredient>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Ingredients"
)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateIngredientRequest>,
) -> AppResult<Json<ApiResponse<Ingredient>>> {
    ensure_admin(&user)?;

    if payload.name.trim().is_empty() || payload.measurement_unit.trim().is_empty() {
        return Err(AppError::BadRequest(
            "name and measurement_unit must not be empty".to_string(),
        ));
    }

    let ingredient = sqlx::query_as::<_, Ingredient>(
        "INSERT INTO ingredients (id, name, measurement_unit) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.measurement_unit)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ingredient_create",
        Some("ingredients"),
        Some(serde_json::json!({ "ingredient_id": ingredient.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Ingredient created",
        ingredient,
        Some(Meta::empty()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like_prefix("%"), "\\%");
        assert_eq!(escape_like_prefix("fl_ur"), "fl\\_ur");
        assert_eq!(escape_like_prefix("a\\b"), "a\\\\b");
        assert_eq!(escape_like_prefix("Flour"), "Flour");
    }
}
