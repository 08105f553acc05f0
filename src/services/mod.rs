pub mod categories;
pub mod inventory;
pub mod orders;
pub mod pharmacies;
pub mod products;
pub mod stores;
