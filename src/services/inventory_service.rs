use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::inventory::{
        MovementList, MovementRow, ProductBrief, SetThresholdsRequest, StockActionResult,
        StockInRequest, StockLevelList, StockLevelRow, StockOutRequest, Thresholds,
    },
    entity::{
        config::{ActiveModel as ConfigActive, Column as ConfigCol, Entity as Config},
        products::{Entity as Products, Model as ProductModel},
        stock_levels::{
            ActiveModel as LevelActive, Column as LevelCol, Entity as StockLevels,
            Model as LevelModel,
        },
        stock_movements::{
            ActiveModel as MovementActive, Column as MovementCol, Entity as StockMovements,
            Model as MovementModel,
        },
    },
    error::{AppError, AppResult},
    models::{StockLevel, StockMovement},
    response::{ApiResponse, PageInfo},
    routes::params::InventoryQuery,
    state::AppState,
};

const LOW_STOCK_KEY: &str = "low_stock_threshold";
const HIGH_STOCK_KEY: &str = "high_stock_threshold";
const DEFAULT_LOW_THRESHOLD: i32 = 10;
const DEFAULT_HIGH_THRESHOLD: i32 = 100;

pub async fn stock_in(
    state: &AppState,
    payload: StockInRequest,
) -> AppResult<ApiResponse<StockActionResult>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id).one(&txn).await?;
    if product.is_none() {
        return Err(AppError::NotFound);
    }

    // Lock the level row so concurrent movements on the same product serialize.
    let existing = StockLevels::find()
        .filter(LevelCol::ProductId.eq(payload.product_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let level = match existing {
        Some(level) => {
            let quantity = level.quantity + payload.quantity;
            let mut active: LevelActive = level.into();
            active.quantity = Set(quantity);
            active.last_updated = Set(Utc::now().into());
            active.update(&txn).await?
        }
        None => {
            LevelActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(payload.product_id),
                quantity: Set(payload.quantity),
                last_updated: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?
        }
    };

    MovementActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(payload.product_id),
        kind: Set("in".to_string()),
        delta: Set(payload.quantity),
        occurred_at: NotSet,
        remark: Set(payload.remark.clone()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        "stock_in",
        Some("stock_levels"),
        Some(serde_json::json!({
            "product_id": payload.product_id,
            "quantity": payload.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        StockActionResult {
            state: true,
            level: level_from_entity(level),
        },
        None,
    ))
}

pub async fn stock_out(
    state: &AppState,
    payload: StockOutRequest,
) -> AppResult<ApiResponse<StockActionResult>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    // Conditional decrement: zero rows affected means the level row is
    // missing or short, so the quantity can never go negative.
    let updated = StockLevels::update_many()
        .col_expr(
            LevelCol::Quantity,
            Expr::col(LevelCol::Quantity).sub(payload.quantity),
        )
        .col_expr(LevelCol::LastUpdated, Expr::value(Utc::now()))
        .filter(LevelCol::ProductId.eq(payload.product_id))
        .filter(LevelCol::Quantity.gte(payload.quantity))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        return Err(AppError::InsufficientStock);
    }

    MovementActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(payload.product_id),
        kind: Set("out".to_string()),
        delta: Set(-payload.quantity),
        occurred_at: NotSet,
        remark: Set(payload.remark.clone()),
    }
    .insert(&txn)
    .await?;

    let level = StockLevels::find()
        .filter(LevelCol::ProductId.eq(payload.product_id))
        .one(&txn)
        .await?;
    let level = match level {
        Some(l) => l,
        None => return Err(AppError::InsufficientStock),
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        "stock_out",
        Some("stock_levels"),
        Some(serde_json::json!({
            "product_id": payload.product_id,
            "quantity": payload.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        StockActionResult {
            state: true,
            level: level_from_entity(level),
        },
        None,
    ))
}

pub async fn list_levels(
    state: &AppState,
    query: InventoryQuery,
) -> AppResult<ApiResponse<StockLevelList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(product_id) = query.product_id {
        condition = condition.add(LevelCol::ProductId.eq(product_id));
    }

    let total = StockLevels::find()
        .filter(condition.clone())
        .count(&state.orm)
        .await? as i64;

    let rows = StockLevels::find()
        .filter(condition)
        .order_by_desc(LevelCol::LastUpdated)
        .find_also_related(Products)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(level, product)| StockLevelRow {
            level: level_from_entity(level),
            product: product.map(product_brief),
        })
        .collect();

    Ok(ApiResponse::success(
        StockLevelList { items },
        Some(PageInfo::new(page, limit, total)),
    ))
}

pub async fn list_movements(
    state: &AppState,
    query: InventoryQuery,
) -> AppResult<ApiResponse<MovementList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(product_id) = query.product_id {
        condition = condition.add(MovementCol::ProductId.eq(product_id));
    }

    let total = StockMovements::find()
        .filter(condition.clone())
        .count(&state.orm)
        .await? as i64;

    let rows = StockMovements::find()
        .filter(condition)
        .order_by_desc(MovementCol::OccurredAt)
        .find_also_related(Products)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(movement, product)| MovementRow {
            movement: movement_from_entity(movement),
            product: product.map(product_brief),
        })
        .collect();

    Ok(ApiResponse::success(
        MovementList { items },
        Some(PageInfo::new(page, limit, total)),
    ))
}

pub async fn get_thresholds(state: &AppState) -> AppResult<ApiResponse<Thresholds>> {
    let thresholds = read_thresholds(&state.orm).await?;
    Ok(ApiResponse::success(thresholds, None))
}

pub async fn set_thresholds(
    state: &AppState,
    payload: SetThresholdsRequest,
) -> AppResult<ApiResponse<Thresholds>> {
    if let Some(low) = payload.low {
        upsert_threshold(&state.orm, LOW_STOCK_KEY, low).await?;
    }
    if let Some(high) = payload.high {
        upsert_threshold(&state.orm, HIGH_STOCK_KEY, high).await?;
    }

    if let Err(err) = log_audit(
        &state.pool,
        "thresholds_set",
        Some("config"),
        Some(serde_json::json!({ "low": payload.low, "high": payload.high })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let thresholds = read_thresholds(&state.orm).await?;
    Ok(ApiResponse::success(thresholds, None))
}

async fn read_thresholds<C: ConnectionTrait>(conn: &C) -> AppResult<Thresholds> {
    Ok(Thresholds {
        low_stock_threshold: read_threshold(conn, LOW_STOCK_KEY, DEFAULT_LOW_THRESHOLD).await?,
        high_stock_threshold: read_threshold(conn, HIGH_STOCK_KEY, DEFAULT_HIGH_THRESHOLD).await?,
    })
}

async fn read_threshold<C: ConnectionTrait>(conn: &C, key: &str, default: i32) -> AppResult<i32> {
    let row = Config::find_by_id(key.to_string()).one(conn).await?;
    Ok(row.and_then(|r| r.value.parse().ok()).unwrap_or(default))
}

async fn upsert_threshold<C: ConnectionTrait>(conn: &C, key: &str, value: i32) -> AppResult<()> {
    let active = ConfigActive {
        key: Set(key.to_string()),
        value: Set(value.to_string()),
    };
    Config::insert(active)
        .on_conflict(
            OnConflict::column(ConfigCol::Key)
                .update_column(ConfigCol::Value)
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

fn level_from_entity(model: LevelModel) -> StockLevel {
    StockLevel {
        id: model.id,
        product_id: model.product_id,
        quantity: model.quantity,
        last_updated: model.last_updated.with_timezone(&Utc),
    }
}

fn movement_from_entity(model: MovementModel) -> StockMovement {
    StockMovement {
        id: model.id,
        product_id: model.product_id,
        kind: model.kind,
        delta: model.delta,
        occurred_at: model.occurred_at.with_timezone(&Utc),
        remark: model.remark,
    }
}

fn product_brief(model: ProductModel) -> ProductBrief {
    ProductBrief {
        id: model.id,
        name: model.name,
    }
}
