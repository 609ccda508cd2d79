use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use recipe_share_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user", "user123", "user").await?;
    seed_ingredients(&pool).await?;
    seed_tags(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    username: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, email, username, password_hash, role) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .execute(pool)
    .await?;

    Ok(id)
}

async fn seed_ingredients(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let items = [
        ("Flour", "g"),
        ("Sugar", "g"),
        ("Egg", "pcs"),
        ("Milk", "ml"),
        ("Butter", "g"),
        ("Salt", "g"),
    ];

    for (name, unit) in items {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM ingredients WHERE name = $1 AND measurement_unit = $2")
                .bind(name)
                .bind(unit)
                .fetch_optional(pool)
                .await?;
        if exists.is_none() {
            sqlx::query(
                "INSERT INTO ingredients (id, name, measurement_unit) VALUES ($1, $2, $3)",
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(unit)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

async fn seed_tags(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let items = [
        ("Breakfast", "#ffa500", "breakfast"),
        ("Lunch", "#00a86b", "lunch"),
        ("Dinner", "#4169e1", "dinner"),
    ];

    for (name, color, slug) in items {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await?;
        if exists.is_none() {
            sqlx::query("INSERT INTO tags (id, name, color, slug) VALUES ($1, $2, $3, $4)")
                .bind(Uuid::new_v4())
                .bind(name)
                .bind(color)
                .bind(slug)
                .execute(pool)
                .await?;
        }
    }

    Ok(())
}
