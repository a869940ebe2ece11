pub mod audit_logs;
pub mod config;
pub mod customers;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod stock_levels;
pub mod stock_movements;

pub use audit_logs::Entity as AuditLogs;
pub use config::Entity as Config;
pub use customers::Entity as Customers;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use stock_levels::Entity as StockLevels;
pub use stock_movements::Entity as StockMovements;
