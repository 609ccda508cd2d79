pub mod auth;
pub mod recipes;
pub mod shopping;
pub mod users;
