use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        recipes::{
            CreateRecipeRequest, IngredientLineDto, IngredientLineRequest, RecipeDto, RecipeList,
            ShortRecipeDto, UpdateRecipeRequest,
        },
        shopping::ShoppingListLine,
        users::{FollowedAuthorDto, SubscriptionList, UserDto, UserList},
    },
    models::{Ingredient, Tag},
    response::{ApiResponse, Meta},
    routes::{auth, health, ingredients, params, recipes, tags, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::list_users,
        users::get_user,
        users::subscriptions,
        users::subscribe,
        users::unsubscribe,
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_cart,
        recipes::remove_from_cart,
        recipes::download_shopping_cart,
        tags::list_tags,
        tags::get_tag,
        tags::create_tag,
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        ingredients::create_ingredient
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserDto,
            UserList,
            FollowedAuthorDto,
            SubscriptionList,
            Tag,
            tags::CreateTagRequest,
            tags::TagList,
            Ingredient,
            ingredients::CreateIngredientRequest,
            ingredients::IngredientList,
            CreateRecipeRequest,
            UpdateRecipeRequest,
            IngredientLineRequest,
            IngredientLineDto,
            RecipeDto,
            RecipeList,
            ShortRecipeDto,
            ShoppingListLine,
            params::Pagination,
            params::RecipeListQuery,
            Meta,
            ApiResponse<RecipeDto>,
            ApiResponse<RecipeList>,
            ApiResponse<UserDto>,
            ApiResponse<SubscriptionList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User profiles and subscriptions"),
        (name = "Recipes", description = "Recipe composition and listing"),
        (name = "Favorites", description = "Favorite toggles"),
        (name = "ShoppingCart", description = "Shopping cart toggles and download"),
        (name = "Tags", description = "Tag catalog"),
        (name = "Ingredients", description = "Ingredient catalog"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
