use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

// Paging fields are inlined rather than flattened: serde_urlencoded cannot
// deserialize non-string fields through `#[serde(flatten)]`, and axum's
// `Query` rejects `?page=2` with a 400 in that shape.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub author: Option<Uuid>,
    /// Only recipes the caller has favorited.
    pub is_favorited: Option<bool>,
    /// Only recipes in the caller's shopping cart.
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix filter.
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn parses_paged_recipe_list_query() {
        let uri: Uri = "/api/recipes?page=2&per_page=10&is_favorited=true"
            .parse()
            .unwrap();
        let Query(query) = Query::<RecipeListQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.page, Some(2));
        assert_eq!(query.per_page, Some(10));
        assert_eq!(query.is_favorited, Some(true));
        assert_eq!(query.is_in_shopping_cart, None);
        assert_eq!(query.pagination().normalize(), (2, 10, 10));
    }

    #[test]
    fn empty_recipe_list_query_defaults() {
        let uri: Uri = "/api/recipes".parse().unwrap();
        let Query(query) = Query::<RecipeListQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.pagination().normalize(), (1, 20, 0));
        assert_eq!(query.author, None);
    }

    #[test]
    fn pagination_clamps_out_of_range_values() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (1, 100, 0));
    }
}
