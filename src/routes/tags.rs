use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Tag,
    response::{ApiResponse, Meta},
    state::AppState,
    validate,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
    /// HEX color, `#RGB` or `#RRGGBB`.
    pub color: String,
    pub slug: String,
}

#[derive(serde::Serialize, ToSchema)]
pub struct TagList {
    pub items: Vec<Tag>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{id}", get(get_tag))
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "List tags ordered by name", body = ApiResponse<TagList>)
    ),
    tag = "Tags"
)]
pub async fn list_tags(State(state): State<AppState>) -> AppResult<Json<ApiResponse<TagList>>> {
    let items = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(ApiResponse::success("Tags", TagList { items }, None)))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Get tag", body = ApiResponse<Tag>),
        (status = 404, description = "Tag not found"),
    ),
    tag = "Tags"
)]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Tag>>> {
    let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let tag = match tag {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };
    Ok(Json(ApiResponse::success("Tag", tag, None)))
}

#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 200, description = "Tag created", body = ApiResponse<Tag>),
        (status = 400, description = "Malformed HEX color or slug"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Name, color or slug already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn create_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTagRequest>,
) -> AppResult<Json<ApiResponse<Tag>>> {
    ensure_admin(&user)?;
    validate::validate_hex_color(&payload.color)?;
    validate::validate_slug(&payload.slug)?;

    let tag = sqlx::query_as::<_, Tag>(
        "INSERT INTO tags (id, name, color, slug) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.color)
    .bind(payload.slug)
    .fetch_one(&state.pool)
    .await
    .map_err(|err| {
        AppError::conflict_on_unique(err, "Tag name, color and slug must be unique")
    })?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "tag_create",
        Some("tags"),
        Some(serde_json::json!({ "tag_id": tag.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Tag created",
        tag,
        Some(Meta::empty()),
    )))
}
