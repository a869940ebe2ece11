use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{StockLevel, StockMovement};

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockInRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockOutRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetThresholdsRequest {
    pub low: Option<i32>,
    pub high: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Thresholds {
    pub low_stock_threshold: i32,
    pub high_stock_threshold: i32,
}

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ProductBrief {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockActionResult {
    pub state: bool,
    pub level: StockLevel,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockLevelRow {
    pub level: StockLevel,
    pub product: Option<ProductBrief>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockLevelList {
    pub items: Vec<StockLevelRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementRow {
    pub movement: StockMovement,
    pub product: Option<ProductBrief>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementList {
    pub items: Vec<MovementRow>,
}
