use crate::{
    db::DbPool,
    entities::{order_detail, product, product_inventory, store},
    errors::ServiceError,
    stats::{self, AllowedPeriod, CountStats},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, Order as SortOrder,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use sea_orm::sea_query::{Expr, Func};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateStoreRequest {
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
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateStoreRequest {
    #[validate(length(min = 1, max = 100))]
    pub store_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
}

/// Trimmed store row returned by name search.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct StoreSearchRow {
    pub id: i32,
    pub store_name: String,
    pub contact_number: String,
    pub address: String,
}

/// Store ranked by total revenue over its sold inventory lines.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct TopStoreRow {
    pub id: i32,
    pub store_name: String,
    pub total_sales: Decimal,
}

/// Inventory line of a store's catalog, flattened with product info.
#[derive(Debug, Serialize)]
pub struct CatalogItem {
    pub product_name: String,
    pub dosage: String,
    pub store_name: String,
    pub public_price: Decimal,
    pub price_after_offer: Decimal,
    pub offer_percent: Decimal,
    pub image: String,
}

const TOP_LIMIT: u64 = 5;

/// Store registry: registration, search, activation and sales rankings.
#[derive(Clone)]
pub struct StoreService {
    db: Arc<DbPool>,
}

impl StoreService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_name = %request.user_name))]
    pub async fn create(&self, request: CreateStoreRequest) -> Result<store::Model, ServiceError> {
        request.validate()?;

        let existing = store::Entity::find()
            .filter(store::Column::UserName.eq(request.user_name.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "store with user name '{}' already exists",
                request.user_name
            )));
        }

        let created = store::ActiveModel {
            user_name: Set(request.user_name),
            store_name: Set(request.store_name),
            email: Set(request.email),
            contact_number: Set(request.contact_number),
            country: Set(request.country),
            governorate: Set(request.governorate),
            region: Set(request.region),
            address: Set(request.address),
            tax_license: Set(request.tax_license),
            tax_card: Set(request.tax_card),
            commercial_register: Set(request.commercial_register),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(store_id = created.id, "store registered");
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> Result<store::Model, ServiceError> {
        store::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store with id {id} not found")))
    }

    /// List stores, optionally filtered by a case-insensitive name fragment.
    pub async fn search(&self, name: Option<&str>) -> Result<Vec<StoreSearchRow>, ServiceError> {
        let mut query = store::Entity::find()
            .select_only()
            .column(store::Column::Id)
            .column(store::Column::StoreName)
            .column(store::Column::ContactNumber)
            .column(store::Column::Address);

        if let Some(name) = name {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(store::Column::StoreName)))
                    .like(format!("%{}%", name.to_lowercase())),
            );
        }

        Ok(query.into_model::<StoreSearchRow>().all(&*self.db).await?)
    }

    pub async fn update(
        &self,
        id: i32,
        request: UpdateStoreRequest,
    ) -> Result<store::Model, ServiceError> {
        request.validate()?;

        let store = self.get(id).await?;
        let mut active: store::ActiveModel = store.into();

        if let Some(store_name) = request.store_name {
            active.store_name = Set(store_name);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(contact_number) = request.contact_number {
            active.contact_number = Set(contact_number);
        }
        if let Some(address) = request.address {
            active.address = Set(address);
        }
        if let Some(region) = request.region {
            active.region = Set(region);
        }

        Ok(active.update(&*self.db).await?)
    }

    /// Flip the activation flag. Setting the current value is a conflict.
    #[instrument(skip(self))]
    pub async fn set_active(&self, id: i32, active: bool) -> Result<store::Model, ServiceError> {
        let store = self.get(id).await?;

        if store.is_active == active {
            let state = if active { "active" } else { "inactive" };
            return Err(ServiceError::Conflict(format!(
                "store with id {id} is already {state}"
            )));
        }

        let mut model: store::ActiveModel = store.into();
        model.is_active = Set(active);
        let updated = model.update(&*self.db).await?;

        info!(store_id = id, is_active = active, "store status updated");
        Ok(updated)
    }

    /// Total store count for the period with its period-over-period delta.
    #[instrument(skip(self))]
    pub async fn total_stores_count(
        &self,
        period: AllowedPeriod,
    ) -> Result<CountStats, ServiceError> {
        if period == AllowedPeriod::AllTime {
            let count = store::Entity::find().count(&*self.db).await?;
            return Ok(CountStats {
                count,
                percentage_change: 0.0,
            });
        }

        let ranges = stats::date_ranges(period, Utc::now())?;
        let current = store::Entity::find()
            .filter(store::Column::CreatedAt.gte(ranges.current_start))
            .filter(store::Column::CreatedAt.lte(ranges.current_end))
            .count(&*self.db)
            .await?;
        let previous = store::Entity::find()
            .filter(store::Column::CreatedAt.gte(ranges.previous_start))
            .filter(store::Column::CreatedAt.lt(ranges.previous_end))
            .count(&*self.db)
            .await?;

        Ok(CountStats {
            count: current,
            percentage_change: stats::percentage_change(current as f64, previous as f64),
        })
    }

    /// Top 5 (or bottom 5) stores by summed price of their sold lines.
    /// Stores that never sold anything are excluded.
    pub async fn top_or_bottom_stores(
        &self,
        is_top: bool,
    ) -> Result<Vec<TopStoreRow>, ServiceError> {
        let direction = if is_top {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };

        Ok(store::Entity::find()
            .select_only()
            .column(store::Column::Id)
            .column(store::Column::StoreName)
            .column_as(order_detail::Column::Price.sum(), "total_sales")
            .join(JoinType::InnerJoin, store::Relation::ProductInventory.def())
            .join(
                JoinType::InnerJoin,
                product_inventory::Relation::OrderDetail.def(),
            )
            .group_by(store::Column::Id)
            .group_by(store::Column::StoreName)
            .having(Expr::expr(order_detail::Column::Price.sum()).gt(0))
            .order_by(order_detail::Column::Price.sum(), direction)
            .limit(TOP_LIMIT)
            .into_model::<TopStoreRow>()
            .all(&*self.db)
            .await?)
    }

    /// A store's sellable catalog: its inventory lines joined to product data.
    pub async fn store_catalog(&self, id: i32) -> Result<Vec<CatalogItem>, ServiceError> {
        let store = self.get(id).await?;

        let lines = product_inventory::Entity::find()
            .filter(product_inventory::Column::StoreId.eq(id))
            .find_also_related(product::Entity)
            .all(&*self.db)
            .await?;

        let mut catalog = Vec::with_capacity(lines.len());
        for (inventory, product) in lines {
            let product = product.ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "inventory line {} references a missing product",
                    inventory.id
                ))
            })?;
            catalog.push(CatalogItem {
                dosage: format!(
                    "{}mg / {} tablets",
                    product.active_ingredient_mg, product.units_per_package
                ),
                product_name: product.name,
                store_name: store.store_name.clone(),
                public_price: product.public_price,
                price_after_offer: inventory.price_after_offer,
                offer_percent: inventory.offer_percent,
                image: product.image,
            });
        }

        Ok(catalog)
    }
}
