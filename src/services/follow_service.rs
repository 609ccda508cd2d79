use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::recipes::ShortRecipeDto,
    dto::users::{FollowedAuthorDto, SubscriptionList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    validate::RECIPE_PREVIEW_LIMIT,
};

pub async fn is_subscribed(pool: &DbPool, user_id: Uuid, author_id: Uuid) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub async fn subscribe(
    pool: &DbPool,
    user: &AuthUser,
    author_id: Uuid,
) -> AppResult<ApiResponse<FollowedAuthorDto>> {
    let author = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(author_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    if user.user_id == author_id {
        return Err(AppError::BadRequest(
            "You cannot subscribe to yourself".to_string(),
        ));
    }

    if is_subscribed(pool, user.user_id, author_id).await? {
        return Err(AppError::Conflict(
            "Already subscribed to this user".to_string(),
        ));
    }

    sqlx::query("INSERT INTO follows (id, user_id, author_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|err| AppError::conflict_on_unique(err, "Already subscribed to this user"))?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "follow_add",
        Some("follows"),
        Some(serde_json::json!({ "author_id": author_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let dto = followed_author(pool, author).await?;
    Ok(ApiResponse::success("Subscribed", dto, Some(Meta::empty())))
}

pub async fn unsubscribe(
    pool: &DbPool,
    user: &AuthUser,
    author_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(user.user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "follow_remove",
        Some("follows"),
        Some(serde_json::json!({ "author_id": author_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Unsubscribed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_subscriptions(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<SubscriptionList>> {
    let (page, limit, offset) = pagination.normalize();

    let authors = sqlx::query_as::<_, User>(
        r#"
        SELECT u.*
        FROM follows fo
        JOIN users u ON u.id = fo.author_id
        WHERE fo.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let mut items = Vec::with_capacity(authors.len());
    for author in authors {
        items.push(followed_author(pool, author).await?);
    }

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "OK",
        SubscriptionList { items },
        Some(meta),
    ))
}

/// Author profile augmented with their recipe count and newest recipes.
/// `is_subscribed` is always true here: the row came from the follow edge.
async fn followed_author(pool: &DbPool, author: User) -> AppResult<FollowedAuthorDto> {
    let recipes_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author.id)
            .fetch_one(pool)
            .await?;

    let recipes = sqlx::query_as::<_, ShortRecipeDto>(
        r#"
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC
        LIMIT $2
        "#,
    )
    .bind(author.id)
    .bind(RECIPE_PREVIEW_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(FollowedAuthorDto {
        id: author.id,
        email: author.email,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: true,
        recipes,
        recipes_count: recipes_count.0,
    })
}
