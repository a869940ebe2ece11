use axum_backoffice_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::inventory::{SetThresholdsRequest, StockInRequest, StockOutRequest},
    entity::products::ActiveModel as ProductActive,
    error::AppError,
    routes::params::{InventoryQuery, Pagination},
    services::inventory_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Ledger flow: stock in/out with movement history, the non-negative
// invariant under sequential and concurrent writes, and thresholds.
#[tokio::test]
async fn stock_ledger_flow() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let product = seed_product(&state, "Test Widget", 12.5).await?;

    // In 50, out 20.
    let resp = inventory_service::stock_in(
        &state,
        StockInRequest {
            product_id: product,
            quantity: 50,
            remark: Some("initial delivery".into()),
        },
    )
    .await?;
    let result = resp.result.data.unwrap();
    assert!(result.state);
    assert_eq!(result.level.quantity, 50);

    let resp = inventory_service::stock_out(
        &state,
        StockOutRequest {
            product_id: product,
            quantity: 20,
            remark: None,
        },
    )
    .await?;
    assert_eq!(resp.result.data.unwrap().level.quantity, 30);

    // History is newest-first and replays to the current level.
    let resp = inventory_service::list_movements(&state, product_query(product)).await?;
    let movements = resp.result.data.unwrap().items;
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].movement.delta, -20);
    assert_eq!(movements[0].movement.kind, "out");
    assert_eq!(movements[1].movement.delta, 50);
    assert_eq!(movements[1].movement.kind, "in");

    let replayed: i32 = movements.iter().map(|m| m.movement.delta).sum();
    assert_eq!(replayed, 30);

    // Level listing carries the product summary.
    let resp = inventory_service::list_levels(&state, product_query(product)).await?;
    let levels = resp.result.data.unwrap().items;
    assert_eq!(levels.len(), 1);
    assert_eq!(levels[0].level.quantity, 30);
    assert_eq!(levels[0].product.as_ref().unwrap().name, "Test Widget");

    // Stock never goes negative.
    let err = inventory_service::stock_out(
        &state,
        StockOutRequest {
            product_id: product,
            quantity: 100,
            remark: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock));

    // Validation failures.
    let err = inventory_service::stock_in(
        &state,
        StockInRequest {
            product_id: product,
            quantity: 0,
            remark: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = inventory_service::stock_in(
        &state,
        StockInRequest {
            product_id: Uuid::new_v4(),
            quantity: 5,
            remark: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Failed operations leave no trace in the history.
    let resp = inventory_service::list_movements(&state, product_query(product)).await?;
    assert_eq!(resp.result.data.unwrap().items.len(), 2);

    // Thresholds: defaults, then partial upserts.
    let resp = inventory_service::get_thresholds(&state).await?;
    let thresholds = resp.result.data.unwrap();
    assert_eq!(thresholds.low_stock_threshold, 10);
    assert_eq!(thresholds.high_stock_threshold, 100);

    let resp = inventory_service::set_thresholds(
        &state,
        SetThresholdsRequest {
            low: Some(5),
            high: None,
        },
    )
    .await?;
    let thresholds = resp.result.data.unwrap();
    assert_eq!(thresholds.low_stock_threshold, 5);
    assert_eq!(thresholds.high_stock_threshold, 100);

    let resp = inventory_service::set_thresholds(
        &state,
        SetThresholdsRequest {
            low: None,
            high: Some(150),
        },
    )
    .await?;
    let thresholds = resp.result.data.unwrap();
    assert_eq!(thresholds.low_stock_threshold, 5);
    assert_eq!(thresholds.high_stock_threshold, 150);

    // Two concurrent out(60) against 100: exactly one succeeds, final 40.
    let contended = seed_product(&state, "Contended Widget", 3.0).await?;
    inventory_service::stock_in(
        &state,
        StockInRequest {
            product_id: contended,
            quantity: 100,
            remark: None,
        },
    )
    .await?;

    let out = |qty| StockOutRequest {
        product_id: contended,
        quantity: qty,
        remark: None,
    };
    let (first, second) = tokio::join!(
        inventory_service::stock_out(&state, out(60)),
        inventory_service::stock_out(&state, out(60)),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let failure = results
        .into_iter()
        .find_map(Result::err)
        .expect("one call must fail");
    assert!(matches!(failure, AppError::InsufficientStock));

    let resp = inventory_service::list_levels(&state, product_query(contended)).await?;
    assert_eq!(resp.result.data.unwrap().items[0].level.quantity, 40);

    let resp = inventory_service::list_movements(&state, product_query(contended)).await?;
    let movements = resp.result.data.unwrap().items;
    let replayed: i32 = movements.iter().map(|m| m.movement.delta).sum();
    assert_eq!(replayed, 40);

    Ok(())
}

fn product_query(product_id: Uuid) -> InventoryQuery {
    InventoryQuery {
        pagination: Pagination {
            page: Some(1),
            page_size: Some(20),
        },
        product_id: Some(product_id),
    }
}

async fn seed_product(state: &AppState, name: &str, price: f64) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        status: Set("active".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, stock_movements, stock_levels, audit_logs, config, products, customers RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState { pool, orm }))
}
