pub mod auth_service;
pub mod cart_service;
pub mod favorite_service;
pub mod follow_service;
pub mod recipe_service;
pub mod user_service;
