use axum::extract::{Json, State};
use recipe_share_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::recipes::{CreateRecipeRequest, IngredientLineRequest, UpdateRecipeRequest},
    entity::{
        ingredients::ActiveModel as IngredientActive, tags::ActiveModel as TagActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    routes::tags::{CreateTagRequest, create_tag},
    services::{cart_service, favorite_service, follow_service, recipe_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: authors compose recipes, a reader favorites them, fills
// a cart, downloads the aggregated shopping list and follows an author.
#[tokio::test]
async fn compose_aggregate_and_toggle_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // Seed users
    let alice_id = create_user(&state, "alice@example.com", "alice", "user").await?;
    let bob_id = create_user(&state, "bob@example.com", "bob", "user").await?;
    let admin_id = create_user(&state, "admin@example.com", "admin", "admin").await?;

    let alice = AuthUser {
        user_id: alice_id,
        role: "user".into(),
    };
    let bob = AuthUser {
        user_id: bob_id,
        role: "user".into(),
    };
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    // Seed catalog
    let flour = create_ingredient(&state, "Flour", "g").await?;
    let egg = create_ingredient(&state, "Egg", "pcs").await?;
    let sugar = create_ingredient(&state, "Sugar", "g").await?;
    let breakfast = create_tag_row(&state, "Breakfast", "#ffa500", "breakfast").await?;

    // cooking_time below the lower bound is rejected
    let err = recipe_service::create_recipe(
        &state,
        &alice,
        recipe_payload("Bad", 0, vec![(flour, 100)], vec![breakfast]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // duplicate ingredient in the payload is rejected
    let err = recipe_service::create_recipe(
        &state,
        &alice,
        recipe_payload("Bad", 10, vec![(flour, 100), (flour, 50)], vec![breakfast]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // unresolvable tag id is NotFound
    let err = recipe_service::create_recipe(
        &state,
        &alice,
        recipe_payload("Bad", 10, vec![(flour, 100)], vec![Uuid::new_v4()]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Recipe A: Flour 200 g, Egg 2; cooking_time at the lower bound
    let recipe_a = recipe_service::create_recipe(
        &state,
        &alice,
        recipe_payload("Pancakes", 1, vec![(flour, 200), (egg, 2)], vec![breakfast]),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(recipe_a.ingredients.len(), 2);
    assert_eq!(recipe_a.author.id, alice_id);
    assert_eq!(recipe_a.tags.len(), 1);

    // Recipe B: Flour 100 g, Sugar 50 g
    let recipe_b = recipe_service::create_recipe(
        &state,
        &alice,
        recipe_payload("Cake", 45, vec![(flour, 100), (sugar, 50)], vec![breakfast]),
    )
    .await?
    .data
    .unwrap();

    // Only the author (or an admin) may update
    let err = recipe_service::update_recipe(
        &state,
        &bob,
        recipe_a.id,
        update_payload(vec![(flour, 10)], vec![breakfast]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Favorites: add, duplicate add conflicts, state stays present
    favorite_service::add_favorite(&state.pool, &bob, recipe_a.id).await?;
    let err = favorite_service::add_favorite(&state.pool, &bob, recipe_a.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(favorite_service::is_favorited(&state.pool, bob_id, recipe_a.id).await?);

    // Removing an absent favorite is NotFound
    let err = favorite_service::remove_favorite(&state.pool, &bob, recipe_b.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Cart: both recipes in, duplicate add conflicts
    cart_service::add_to_cart(&state.pool, &bob, recipe_a.id).await?;
    cart_service::add_to_cart(&state.pool, &bob, recipe_b.id).await?;
    let err = cart_service::add_to_cart(&state.pool, &bob, recipe_a.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Aggregation sums per ingredient across the cart, ordered by name
    let lines = cart_service::build_shopping_list(&state.pool, bob_id).await?;
    let summary: Vec<(String, i64, String)> = lines
        .iter()
        .map(|l| (l.name.clone(), l.total, l.measurement_unit.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Egg".to_string(), 2, "pcs".to_string()),
            ("Flour".to_string(), 300, "g".to_string()),
            ("Sugar".to_string(), 50, "g".to_string()),
        ]
    );
    assert_eq!(
        cart_service::render_shopping_list(&lines),
        "Egg, 2 pcs\nFlour, 300 g\nSugar, 50 g"
    );

    // Replace-all update: recipe A keeps identity, holds exactly the new set
    let updated = recipe_service::update_recipe(
        &state,
        &alice,
        recipe_a.id,
        update_payload(vec![(sugar, 10)], vec![breakfast]),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.id, recipe_a.id);
    assert_eq!(updated.pub_date, recipe_a.pub_date);
    assert_eq!(updated.ingredients.len(), 1);
    assert_eq!(updated.ingredients[0].id, sugar);
    assert_eq!(updated.ingredients[0].amount, 10);

    // The aggregate follows the new ingredient set
    let lines = cart_service::build_shopping_list(&state.pool, bob_id).await?;
    let names: Vec<&str> = lines.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Flour", "Sugar"]);

    // Follows: self-follow is a validation error, duplicate conflicts
    let err = follow_service::subscribe(&state.pool, &bob, bob_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let followed = follow_service::subscribe(&state.pool, &bob, alice_id)
        .await?
        .data
        .unwrap();
    assert!(followed.is_subscribed);
    assert_eq!(followed.recipes_count, 2);
    assert!(followed.recipes.len() <= 3);

    let err = follow_service::subscribe(&state.pool, &bob, alice_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let subs = follow_service::list_subscriptions(
        &state.pool,
        &bob,
        Pagination {
            page: Some(1),
            per_page: Some(20),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(subs.items.len(), 1);
    assert_eq!(subs.items[0].username, "alice");

    follow_service::unsubscribe(&state.pool, &bob, alice_id).await?;
    let err = follow_service::unsubscribe(&state.pool, &bob, alice_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Tag creation: "red" is not a HEX color; admin gate applies
    let err = create_tag(
        State(state.clone()),
        admin.clone(),
        Json(CreateTagRequest {
            name: "Dinner".into(),
            color: "red".into(),
            slug: "dinner".into(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = create_tag(
        State(state.clone()),
        bob.clone(),
        Json(CreateTagRequest {
            name: "Dinner".into(),
            color: "#f00".into(),
            slug: "dinner".into(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let created = create_tag(
        State(state.clone()),
        admin.clone(),
        Json(CreateTagRequest {
            name: "Dinner".into(),
            color: "#f00".into(),
            slug: "dinner".into(),
        }),
    )
    .await?;
    let tag = created.0.data.unwrap();
    assert_eq!(tag.color, "#f00");

    // Reusing the taken color conflicts at the unique index
    let err = create_tag(
        State(state.clone()),
        admin.clone(),
        Json(CreateTagRequest {
            name: "Supper".into(),
            color: "#f00".into(),
            slug: "supper".into(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Empty cart renders an empty file
    cart_service::remove_from_cart(&state.pool, &bob, recipe_a.id).await?;
    cart_service::remove_from_cart(&state.pool, &bob, recipe_b.id).await?;
    let lines = cart_service::build_shopping_list(&state.pool, bob_id).await?;
    assert!(lines.is_empty());
    assert_eq!(cart_service::render_shopping_list(&lines), "");

    // Admin may delete another author's recipe; cascades clean the joins
    recipe_service::delete_recipe(&state, &admin, recipe_b.id).await?;
    let err = recipe_service::get_recipe(&state, Some(&bob), recipe_b.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

fn recipe_payload(
    name: &str,
    cooking_time: i32,
    ingredients: Vec<(Uuid, i32)>,
    tags: Vec<Uuid>,
) -> CreateRecipeRequest {
    CreateRecipeRequest {
        name: name.to_string(),
        text: format!("How to cook {name}"),
        image: None,
        cooking_time,
        ingredients: ingredients
            .into_iter()
            .map(|(id, amount)| IngredientLineRequest { id, amount })
            .collect(),
        tags,
    }
}

fn update_payload(ingredients: Vec<(Uuid, i32)>, tags: Vec<Uuid>) -> UpdateRecipeRequest {
    UpdateRecipeRequest {
        name: None,
        text: None,
        image: None,
        cooking_time: None,
        ingredients: ingredients
            .into_iter()
            .map(|(id, amount)| IngredientLineRequest { id, amount })
            .collect(),
        tags,
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, follows, shopping_list, favorites, recipe_tags, ingredient_amounts, recipes, tags, ingredients, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}

async fn create_user(
    state: &AppState,
    email: &str,
    username: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        username: Set(username.to_string()),
        first_name: Set(None),
        last_name: Set(None),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_ingredient(state: &AppState, name: &str, unit: &str) -> anyhow::Result<Uuid> {
    let ingredient = IngredientActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        measurement_unit: Set(unit.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ingredient.id)
}

async fn create_tag_row(
    state: &AppState,
    name: &str,
    color: &str,
    slug: &str,
) -> anyhow::Result<Uuid> {
    let tag = TagActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        color: Set(color.to_string()),
        slug: Set(slug.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(tag.id)
}
