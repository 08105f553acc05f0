use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A seller account with its identity and tax paperwork. Stores are never
/// hard-deleted; `is_active` gates their visibility.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    #[validate(length(min = 3, max = 50))]
    pub user_name: String,

    #[validate(length(min = 1, max = 100))]
    pub store_name: String,

    #[validate(email)]
    pub email: String,

    pub contact_number: String,
    pub country: String,
    pub governorate: String,
    pub region: String,
    pub address: String,
    pub tax_license: String,
    pub tax_card: String,
    pub commercial_register: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_inventory::Entity")]
    ProductInventory,
}

impl Related<super::product_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductInventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
