use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::recipes::ShortRecipeDto, models::User};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_subscribed: bool,
}

impl UserDto {
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<UserDto>,
}

/// One followed author in the subscriptions view: profile plus their recipe
/// count and a short preview of their newest recipes.
#[derive(Debug, Serialize, ToSchema)]
pub struct FollowedAuthorDto {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_subscribed: bool,
    pub recipes: Vec<ShortRecipeDto>,
    pub recipes_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionList {
    pub items: Vec<FollowedAuthorDto>,
}
