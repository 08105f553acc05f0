use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One order line. `price` is a snapshot of price_after_offer * quantity at
/// submission time and is never recomputed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    pub product_inventory_id: i32,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product_inventory::Entity",
        from = "Column::ProductInventoryId",
        to = "super::product_inventory::Column::Id"
    )]
    ProductInventory,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductInventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
