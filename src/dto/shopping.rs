use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// One aggregated line of the downloadable shopping list.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ShoppingListLine {
    pub name: String,
    pub total: i64,
    pub measurement_unit: String,
}
