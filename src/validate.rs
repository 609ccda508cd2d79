use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

/// Two historical schema revisions disagreed on these bounds (300 vs 1000
/// minutes, 32 vs 256 units); the later revision is authoritative here.
pub const COOKING_TIME_RANGE: RangeInclusive<i32> = 1..=1000;
pub const INGREDIENT_AMOUNT_RANGE: RangeInclusive<i32> = 1..=256;

/// Number of recipes shown per author in the subscriptions view.
pub const RECIPE_PREVIEW_LIMIT: i64 = 3;

pub const RESERVED_USERNAME: &str = "me";

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").unwrap());

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9._-]{1,149}$").unwrap());

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

pub fn validate_cooking_time(cooking_time: i32) -> AppResult<()> {
    if !COOKING_TIME_RANGE.contains(&cooking_time) {
        return Err(AppError::BadRequest(format!(
            "cooking_time must be between {} and {} minutes",
            COOKING_TIME_RANGE.start(),
            COOKING_TIME_RANGE.end()
        )));
    }
    Ok(())
}

pub fn validate_ingredient_amount(amount: i32) -> AppResult<()> {
    if !INGREDIENT_AMOUNT_RANGE.contains(&amount) {
        return Err(AppError::BadRequest(format!(
            "amount must be between {} and {}",
            INGREDIENT_AMOUNT_RANGE.start(),
            INGREDIENT_AMOUNT_RANGE.end()
        )));
    }
    Ok(())
}

pub fn validate_hex_color(color: &str) -> AppResult<()> {
    if !HEX_COLOR_RE.is_match(color) {
        return Err(AppError::BadRequest(format!(
            "color must be a HEX value like #RGB or #RRGGBB, got '{color}'"
        )));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> AppResult<()> {
    if username == RESERVED_USERNAME {
        return Err(AppError::BadRequest(format!(
            "username '{RESERVED_USERNAME}' is reserved"
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::BadRequest(
            "username must start with a letter and contain only letters, digits, '.', '-' or '_'"
                .to_string(),
        ));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> AppResult<()> {
    if slug.is_empty() || slug.len() > 200 || !SLUG_RE.is_match(slug) {
        return Err(AppError::BadRequest(format!(
            "slug must contain only letters, digits, '-' or '_', got '{slug}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooking_time_bounds() {
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(1).is_ok());
        assert!(validate_cooking_time(1000).is_ok());
        assert!(validate_cooking_time(1001).is_err());
    }

    #[test]
    fn ingredient_amount_bounds() {
        assert!(validate_ingredient_amount(0).is_err());
        assert!(validate_ingredient_amount(1).is_ok());
        assert!(validate_ingredient_amount(256).is_ok());
        assert!(validate_ingredient_amount(257).is_err());
    }

    #[test]
    fn hex_color_format() {
        assert!(validate_hex_color("red").is_err());
        assert!(validate_hex_color("#f00").is_ok());
        assert!(validate_hex_color("#ff0000").is_ok());
        assert!(validate_hex_color("#ff00").is_err());
        assert!(validate_hex_color("ff0000").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("me").is_err());
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("alice.b-c_d").is_ok());
        assert!(validate_username("1alice").is_err());
        assert!(validate_username("a").is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn slug_rules() {
        assert!(validate_slug("breakfast").is_ok());
        assert!(validate_slug("week-end_2").is_ok());
        assert!(validate_slug("no spaces").is_err());
        assert!(validate_slug("").is_err());
    }
}
