use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        CreateOrderRequest, CustomerSummary, OrderDetail, OrderItemDetail, OrderItemInput,
        OrderList, ProductSummary, UpdateLogisticsRequest, UpdateOrderRequest, UpdateStatusRequest,
    },
    entity::{
        customers::{Column as CustomerCol, Entity as Customers, Model as CustomerModel},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    idgen::{self, IdKind},
    models::{Order, OrderItem},
    response::{ApiResponse, PageInfo},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

// Identifier collisions slip past the generator's pre-check under
// concurrency; the primary key rejects them and the insert is retried.
const MAX_HEADER_ATTEMPTS: usize = 3;

pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest(
            "order must contain at least one item".to_string(),
        ));
    }
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(
                "item quantity must be greater than 0".to_string(),
            ));
        }
    }

    let status = payload.status.clone().unwrap_or_else(|| "created".to_string());
    validate_order_status(&status)?;

    let customer = Customers::find_by_id(payload.customer_id.clone())
        .one(&state.orm)
        .await?;
    if customer.is_none() {
        return Err(AppError::NotFound);
    }

    // Quoted prices are the snapshot for this order; the live catalog
    // price is not re-read.
    let total_amount: f64 = payload
        .items
        .iter()
        .map(|item| item.price * f64::from(item.quantity))
        .sum();

    let mut attempts = 0;
    let order = loop {
        let order_id = idgen::allocate(&state.orm, IdKind::Order).await?;
        let txn = state.orm.begin().await?;

        let inserted = OrderActive {
            id: Set(order_id),
            customer_id: Set(payload.customer_id.clone()),
            status: Set(status.clone()),
            total_amount: Set(total_amount),
            logistics_company: Set(payload.logistics_company.clone()),
            tracking_number: Set(payload.tracking_number.clone()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await;

        match inserted {
            Ok(order) => {
                insert_items(&txn, &order.id, &payload.items).await?;
                txn.commit().await?;
                break order;
            }
            Err(err) => {
                txn.rollback().await.ok();
                attempts += 1;
                if is_unique_violation(&err) && attempts < MAX_HEADER_ATTEMPTS {
                    continue;
                }
                return Err(err.into());
            }
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success(detail, None))
}

pub async fn get_order(state: &AppState, id: String) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success(detail, None))
}

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let order_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let customer_ids: Vec<String> = orders.iter().map(|o| o.customer_id.clone()).collect();

    let customers: HashMap<String, CustomerSummary> = Customers::find()
        .filter(CustomerCol::Id.is_in(customer_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), customer_summary(c)))
        .collect();

    let mut items_by_order: HashMap<String, Vec<OrderItemDetail>> = HashMap::new();
    for (item, product) in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .find_also_related(Products)
        .all(&state.orm)
        .await?
    {
        items_by_order
            .entry(item.order_id.clone())
            .or_default()
            .push(item_detail(item, product));
    }

    let items = orders
        .into_iter()
        .map(|order| {
            let customer = customers.get(&order.customer_id).cloned();
            let order_items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderDetail {
                order: order_from_entity(order),
                customer,
                items: order_items,
            }
        })
        .collect();

    let meta = PageInfo::new(page, limit, total);
    Ok(ApiResponse::success(OrderList { items }, Some(meta)))
}

pub async fn update_order(
    state: &AppState,
    id: String,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    if let Some(status) = payload.status.as_ref() {
        validate_order_status(status)?;
    }
    if let Some(items) = payload.items.as_ref() {
        for item in items {
            if item.quantity <= 0 {
                return Err(AppError::BadRequest(
                    "item quantity must be greater than 0".to_string(),
                ));
            }
        }
    }

    let txn = state.orm.begin().await?;

    let existing = Orders::find_by_id(id).one(&txn).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    if let Some(customer_id) = payload.customer_id {
        active.customer_id = Set(customer_id);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(total_amount) = payload.total_amount {
        active.total_amount = Set(total_amount);
    }
    if let Some(company) = payload.logistics_company {
        active.logistics_company = Set(Some(company));
    }
    if let Some(tracking) = payload.tracking_number {
        active.tracking_number = Set(Some(tracking));
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    // Item edits replace the full set; partial edits are not supported.
    if let Some(items) = payload.items.filter(|items| !items.is_empty()) {
        OrderItems::delete_many()
            .filter(OrderItemCol::OrderId.eq(order.id.clone()))
            .exec(&txn)
            .await?;
        insert_items(&txn, &order.id, &items).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        "order_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success(detail, None))
}

pub async fn update_status(
    state: &AppState,
    id: String,
    payload: UpdateStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    validate_order_status(&payload.status)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(order_from_entity(order), None))
}

pub async fn update_logistics(
    state: &AppState,
    id: String,
    payload: UpdateLogisticsRequest,
) -> AppResult<ApiResponse<Order>> {
    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.logistics_company = Set(payload.logistics_company);
    active.tracking_number = Set(payload.tracking_number);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        "order_logistics_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(order_from_entity(order), None))
}

pub async fn delete_order(
    state: &AppState,
    id: String,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let existing = Orders::find_by_id(id.clone()).one(&txn).await?;
    if existing.is_none() {
        return Err(AppError::NotFound);
    }

    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(id.clone()))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(id.clone()).exec(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(serde_json::json!({}), None))
}

async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    order_id: &str,
    items: &[OrderItemInput],
) -> AppResult<()> {
    for item in items {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id.to_string()),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            price: Set(item.price),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn load_detail<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderDetail> {
    let customer = Customers::find_by_id(order.customer_id.clone())
        .one(conn)
        .await?
        .map(customer_summary);

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id.clone()))
        .find_also_related(Products)
        .all(conn)
        .await?
        .into_iter()
        .map(|(item, product)| item_detail(item, product))
        .collect();

    Ok(OrderDetail {
        order: order_from_entity(order),
        customer,
        items,
    })
}

fn validate_order_status(status: &str) -> Result<(), AppError> {
    const VALID: [&str; 5] = ["created", "processing", "shipped", "completed", "cancelled"];
    if VALID.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid order status".into()))
    }
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        customer_id: model.customer_id,
        status: model.status,
        total_amount: model.total_amount,
        logistics_company: model.logistics_company,
        tracking_number: model.tracking_number,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn item_detail(item: OrderItemModel, product: Option<ProductModel>) -> OrderItemDetail {
    OrderItemDetail {
        item: order_item_from_entity(item),
        product: product.map(product_summary),
    }
}

fn customer_summary(model: CustomerModel) -> CustomerSummary {
    CustomerSummary {
        id: model.id,
        name: model.name,
    }
}

fn product_summary(model: ProductModel) -> ProductSummary {
    ProductSummary {
        id: model.id,
        name: model.name,
        price: model.price,
    }
}
