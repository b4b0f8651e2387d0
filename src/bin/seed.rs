use order_desk::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Ensure migrations are applied.
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;
    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user", "user@example.com", "user123", "user").await?;
    let category_id = ensure_category(&pool, "Coins", "Collectible coins").await?;
    seed_items(&pool, category_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str, description: &str) -> anyhow::Result<Uuid> {
    let (category_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, description)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(category_id)
}

async fn seed_items(pool: &sqlx::PgPool, category_id: Uuid) -> anyhow::Result<()> {
    let items = [
        ("1947 Half Anna", "George VI copper-nickel", 1947, "COIN-1947-HA", 1200, 18, 40),
        ("1918 One Rupee", "George V silver", 1918, "COIN-1918-OR", 4500, 18, 12),
        ("1950 One Pice", "First Republic issue", 1950, "COIN-1950-OP", 350, 5, 150),
        ("1862 Quarter Rupee", "Victoria silver", 1862, "COIN-1862-QR", 9800, 12, 5),
    ];

    for (name, desc, year, sku, price, gst, stock) in items {
        sqlx::query(
            r#"
            INSERT INTO items (id, category_id, name, description, year, sku, price, gst, stock, sold)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(name)
        .bind(desc)
        .bind(year)
        .bind(sku)
        .bind(Decimal::from(price))
        .bind(Decimal::from(gst))
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded items");
    Ok(())
}
