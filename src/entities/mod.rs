pub mod category;
pub mod order;
pub mod order_detail;
pub mod pharmacy;
pub mod product;
pub mod product_inventory;
pub mod store;
