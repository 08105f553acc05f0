use std::sync::Arc;

use crate::db::DbPool;
use crate::services::{
    categories::CategoryService, inventory::InventoryService, orders::OrderService,
    pharmacies::PharmacyService, products::ProductService, stores::StoreService,
};

pub mod common;
pub mod inventory;
pub mod orders;
pub mod pharmacies;
pub mod products;
pub mod stores;

/// Aggregate of the services used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderService,
    pub stores: StoreService,
    pub pharmacies: PharmacyService,
    pub inventory: InventoryService,
    pub products: ProductService,
    pub categories: CategoryService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            orders: OrderService::new(db.clone()),
            stores: StoreService::new(db.clone()),
            pharmacies: PharmacyService::new(db.clone()),
            inventory: InventoryService::new(db.clone()),
            products: ProductService::new(db.clone()),
            categories: CategoryService::new(db),
        }
    }
}
