use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::inventory::{
        MovementList, SetThresholdsRequest, StockActionResult, StockInRequest, StockLevelList,
        StockOutRequest, Thresholds,
    },
    error::AppResult,
    response::ApiResponse,
    routes::params::InventoryQuery,
    services::inventory_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_levels))
        .route("/in", post(stock_in))
        .route("/out", post(stock_out))
        .route("/history", get(list_movements))
        .route("/thresholds", get(get_thresholds).put(set_thresholds))
}

#[utoipa::path(
    post,
    path = "/inventory/in",
    request_body = StockInRequest,
    responses(
        (status = 200, description = "Stock added", body = ApiResponse<StockActionResult>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Product not found"),
    ),
    tag = "Inventory"
)]
pub async fn stock_in(
    State(state): State<AppState>,
    Json(payload): Json<StockInRequest>,
) -> AppResult<Json<ApiResponse<StockActionResult>>> {
    let resp = inventory_service::stock_in(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/inventory/out",
    request_body = StockOutRequest,
    responses(
        (status = 200, description = "Stock removed", body = ApiResponse<StockActionResult>),
        (status = 400, description = "Invalid quantity"),
        (status = 409, description = "Insufficient stock"),
    ),
    tag = "Inventory"
)]
pub async fn stock_out(
    State(state): State<AppState>,
    Json(payload): Json<StockOutRequest>,
) -> AppResult<Json<ApiResponse<StockActionResult>>> {
    let resp = inventory_service::stock_out(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/inventory",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page, default 20"),
        ("product_id" = Option<Uuid>, Query, description = "Filter by product"),
    ),
    responses(
        (status = 200, description = "Current stock levels", body = ApiResponse<StockLevelList>),
    ),
    tag = "Inventory"
)]
pub async fn list_levels(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> AppResult<Json<ApiResponse<StockLevelList>>> {
    let resp = inventory_service::list_levels(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/inventory/history",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page, default 20"),
        ("product_id" = Option<Uuid>, Query, description = "Filter by product"),
    ),
    responses(
        (status = 200, description = "Movement history, newest first", body = ApiResponse<MovementList>),
    ),
    tag = "Inventory"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> AppResult<Json<ApiResponse<MovementList>>> {
    let resp = inventory_service::list_movements(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/inventory/thresholds",
    responses(
        (status = 200, description = "Current thresholds", body = ApiResponse<Thresholds>),
    ),
    tag = "Inventory"
)]
pub async fn get_thresholds(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Thresholds>>> {
    let resp = inventory_service::get_thresholds(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/inventory/thresholds",
    request_body = SetThresholdsRequest,
    responses(
        (status = 200, description = "Thresholds updated", body = ApiResponse<Thresholds>),
    ),
    tag = "Inventory"
)]
pub async fn set_thresholds(
    State(state): State<AppState>,
    Json(payload): Json<SetThresholdsRequest>,
) -> AppResult<Json<ApiResponse<Thresholds>>> {
    let resp = inventory_service::set_thresholds(&state, payload).await?;
    Ok(Json(resp))
}
