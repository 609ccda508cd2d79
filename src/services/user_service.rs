use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::users::{UserDto, UserList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::follow_service,
};

pub async fn list_users(
    pool: &DbPool,
    viewer: Option<&AuthUser>,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = pagination.normalize();

    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users ORDER BY username LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let mut items = Vec::with_capacity(users.len());
    for user in users {
        let is_subscribed = match viewer {
            Some(viewer) => follow_service::is_subscribed(pool, viewer.user_id, user.id).await?,
            None => false,
        };
        items.push(UserDto::from_user(user, is_subscribed));
    }

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", UserList { items }, Some(meta)))
}

pub async fn get_user(
    pool: &DbPool,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<UserDto>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let is_subscribed = match viewer {
        Some(viewer) => follow_service::is_subscribed(pool, viewer.user_id, user.id).await?,
        None => false,
    };

    Ok(ApiResponse::success(
        "OK",
        UserDto::from_user(user, is_subscribed),
        Some(Meta::empty()),
    ))
}
