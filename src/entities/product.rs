use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog item. Read-only from the order engine's perspective; pricing at
/// the point of sale lives on the inventory line.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub image: String,
    pub units_per_package: i32,
    /// Active ingredient per tablet, in milligrams
    pub active_ingredient_mg: i32,
    pub public_price: Decimal,
    pub category_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::product_inventory::Entity")]
    ProductInventory,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductInventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
