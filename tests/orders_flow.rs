use axum_backoffice_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{
        CreateOrderRequest, OrderItemInput, UpdateLogisticsRequest, UpdateOrderRequest,
        UpdateStatusRequest,
    },
    entity::{
        customers::ActiveModel as CustomerActive,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::Entity as Orders,
        products::ActiveModel as ProductActive,
    },
    error::AppError,
    idgen::{self, IdKind},
    routes::params::{OrderListQuery, Pagination},
    services::order_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    Statement,
};
use uuid::Uuid;

#[test]
fn identifier_candidates_are_eight_digits_without_leading_zero() {
    for _ in 0..1000 {
        let id = idgen::candidate();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
        assert_ne!(&id[..1], "0");
    }
}

// Order flow: create with computed total, projections, item replacement,
// narrow mutators, atomic rollback, identifier collision handling, delete.
#[tokio::test]
async fn order_lifecycle_flow() -> anyhow::Result<()> {
    let state = match setup_state().await? {
        Some(s) => s,
        None => return Ok(()),
    };

    let customer_id = seed_customer(&state, "Test Customer").await?;
    let p1 = seed_product(&state, "Test Widget", 9.5).await?;
    let p2 = seed_product(&state, "Test Gadget", 20.0).await?;
    let p3 = seed_product(&state, "Test Gizmo", 5.0).await?;

    // Create: total is computed from the quoted prices.
    let resp = order_service::create_order(
        &state,
        CreateOrderRequest {
            customer_id: customer_id.clone(),
            items: vec![
                OrderItemInput {
                    product_id: p1,
                    quantity: 2,
                    price: 9.5,
                },
                OrderItemInput {
                    product_id: p2,
                    quantity: 1,
                    price: 20.0,
                },
            ],
            status: None,
            logistics_company: None,
            tracking_number: None,
        },
    )
    .await?;
    let detail = resp.result.data.unwrap();
    let order_id = detail.order.id.clone();

    assert_eq!(detail.order.total_amount, 39.0);
    assert_eq!(detail.order.status, "created");
    assert_eq!(detail.items.len(), 2);
    assert_eq!(order_id.len(), 8);
    assert!(order_id.chars().all(|c| c.is_ascii_digit()));
    assert_ne!(&order_id[..1], "0");
    assert_eq!(detail.customer.as_ref().unwrap().name, "Test Customer");
    assert!(detail.items.iter().all(|i| i.product.is_some()));

    // Validation failures.
    let err = order_service::create_order(
        &state,
        CreateOrderRequest {
            customer_id: customer_id.clone(),
            items: vec![],
            status: None,
            logistics_company: None,
            tracking_number: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = order_service::create_order(
        &state,
        CreateOrderRequest {
            customer_id: "00000000".into(),
            items: vec![OrderItemInput {
                product_id: p1,
                quantity: 1,
                price: 9.5,
            }],
            status: None,
            logistics_company: None,
            tracking_number: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // A failing item insert rolls the whole order back.
    let orders_before = Orders::find().count(&state.orm).await?;
    let result = order_service::create_order(
        &state,
        CreateOrderRequest {
            customer_id: customer_id.clone(),
            items: vec![OrderItemInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
                price: 1.0,
            }],
            status: None,
            logistics_company: None,
            tracking_number: None,
        },
    )
    .await;
    assert!(result.is_err());
    let orders_after = Orders::find().count(&state.orm).await?;
    assert_eq!(orders_before, orders_after);

    // Read paths.
    let resp = order_service::get_order(&state, order_id.clone()).await?;
    assert_eq!(resp.result.data.unwrap().order.total_amount, 39.0);

    let err = order_service::get_order(&state, "00000000".into())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let resp = order_service::list_orders(
        &state,
        OrderListQuery {
            pagination: Pagination {
                page: Some(1),
                page_size: Some(20),
            },
            status: None,
            sort_order: None,
        },
    )
    .await?;
    let listed = resp.result.data.unwrap().items;
    assert!(listed.iter().any(|d| d.order.id == order_id));
    assert!(listed.iter().all(|d| !d.items.is_empty()));

    // Item replacement: the full set is swapped for the new one.
    let resp = order_service::update_order(
        &state,
        order_id.clone(),
        UpdateOrderRequest {
            customer_id: None,
            status: None,
            total_amount: None,
            logistics_company: None,
            tracking_number: None,
            items: Some(vec![OrderItemInput {
                product_id: p3,
                quantity: 1,
                price: 5.0,
            }]),
        },
    )
    .await?;
    let detail = resp.result.data.unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].item.product_id, p3);

    // Narrow mutators.
    let resp = order_service::update_status(
        &state,
        order_id.clone(),
        UpdateStatusRequest {
            status: "shipped".into(),
        },
    )
    .await?;
    assert_eq!(resp.result.data.unwrap().status, "shipped");

    let err = order_service::update_status(
        &state,
        order_id.clone(),
        UpdateStatusRequest {
            status: "teleported".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let resp = order_service::update_logistics(
        &state,
        order_id.clone(),
        UpdateLogisticsRequest {
            logistics_company: Some("Test Express".into()),
            tracking_number: Some("TE123456".into()),
        },
    )
    .await?;
    let order = resp.result.data.unwrap();
    assert_eq!(order.logistics_company.as_deref(), Some("Test Express"));
    assert_eq!(order.tracking_number.as_deref(), Some("TE123456"));

    // Collision: a taken candidate is skipped, the next free one is used.
    let mut draws = vec![order_id.clone(), "87654321".to_string()].into_iter();
    let allocated =
        idgen::allocate_with(&state.orm, IdKind::Order, move || draws.next().unwrap()).await?;
    assert_eq!(allocated, "87654321");

    // A draw source that never frees up exhausts the retry cap.
    let taken = order_id.clone();
    let err = idgen::allocate_with(&state.orm, IdKind::Order, || taken.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IdentifierSpaceExhausted));

    // Delete cascades to items.
    order_service::delete_order(&state, order_id.clone()).await?;
    let err = order_service::get_order(&state, order_id.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let orphaned = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id.clone()))
        .count(&state.orm)
        .await?;
    assert_eq!(orphaned, 0);

    let err = order_service::delete_order(&state, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

async fn seed_customer(state: &AppState, name: &str) -> anyhow::Result<String> {
    let id = idgen::allocate(&state.orm, IdKind::Customer).await?;
    let customer = CustomerActive {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(Some("customer@example.com".into())),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(customer.id)
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
