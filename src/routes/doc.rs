use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        inventory::{
            MovementList, MovementRow, ProductBrief, SetThresholdsRequest, StockActionResult,
            StockInRequest, StockLevelList, StockLevelRow, StockOutRequest, Thresholds,
        },
        orders::{
            CreateOrderRequest, CustomerSummary, OrderDetail, OrderItemDetail, OrderItemInput,
            OrderList, ProductSummary, UpdateLogisticsRequest, UpdateOrderRequest,
            UpdateStatusRequest,
        },
    },
    models::{Customer, Order, OrderItem, Product, StockLevel, StockMovement},
    response::{ApiResponse, PageInfo},
    routes::{health, inventory, orders, params},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        inventory::stock_in,
        inventory::stock_out,
        inventory::list_levels,
        inventory::list_movements,
        inventory::get_thresholds,
        inventory::set_thresholds,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order,
        orders::update_status,
        orders::update_logistics,
        orders::delete_order,
    ),
    components(
        schemas(
            Customer,
            Product,
            StockLevel,
            StockMovement,
            Order,
            OrderItem,
            StockInRequest,
            StockOutRequest,
            SetThresholdsRequest,
            Thresholds,
            StockActionResult,
            StockLevelRow,
            StockLevelList,
            MovementRow,
            MovementList,
            ProductBrief,
            CreateOrderRequest,
            UpdateOrderRequest,
            UpdateStatusRequest,
            UpdateLogisticsRequest,
            OrderItemInput,
            OrderItemDetail,
            OrderDetail,
            OrderList,
            CustomerSummary,
            ProductSummary,
            params::Pagination,
            params::InventoryQuery,
            params::OrderListQuery,
            PageInfo,
            ApiResponse<StockActionResult>,
            ApiResponse<StockLevelList>,
            ApiResponse<MovementList>,
            ApiResponse<Thresholds>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<Order>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Inventory", description = "Stock ledger endpoints"),
        (name = "Orders", description = "Order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
