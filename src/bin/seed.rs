use axum_backoffice_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    seed_customers(&pool).await?;
    seed_products(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_customers(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // Fixed ids keep reruns idempotent.
    let customers = vec![
        ("10000001", "Acme Retail", "orders@acme.example"),
        ("10000002", "Northwind Trading", "purchasing@northwind.example"),
    ];

    for (id, name, email) in customers {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .execute(pool)
        .await?;
    }

    println!("Seeded customers");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            Uuid::from_u128(0x1001),
            "Warehouse Shelf Unit",
            "Five-tier steel shelving",
            89.9,
        ),
        (
            Uuid::from_u128(0x1002),
            "Barcode Scanner",
            "Handheld 2D scanner",
            45.0,
        ),
        (
            Uuid::from_u128(0x1003),
            "Thermal Label Roll",
            "100x150mm, 500 labels",
            6.5,
        ),
    ];

    for (id, name, desc, price) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
