use crate::{
    db::DbPool,
    entities::{category, product, product_inventory, store},
    errors::ServiceError,
    stats::{self, AllowedPeriod, CountStats},
};
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, Order as SortOrder,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateInventoryRequest {
    pub store_id: i32,
    pub product_id: i32,
    #[validate(range(min = 0))]
    pub amount: i32,
    /// Discount applied to the product's public price, 0-100
    #[validate(range(min = 0.0, max = 100.0))]
    pub offer_percent: f64,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateInventoryRequest {
    #[validate(range(min = 0))]
    pub amount: Option<i32>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub offer_percent: Option<f64>,
}

/// Filter parameters for the aggregated product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub category_id: Option<i32>,
}

/// Product with its stock summed across all stores.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct ProductStockRow {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub units_per_package: i32,
    pub public_price: Decimal,
    pub category: String,
    pub total_amount: i64,
}

/// Inventory line with a high discount, for the deals widget.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct HotDealRow {
    pub id: i32,
    pub product_name: String,
    pub image: String,
    pub public_price: Decimal,
    pub offer_percent: Decimal,
    pub price_after_offer: Decimal,
}

const HOT_DEALS_LIMIT: u64 = 10;

/// Derived offer price: public price discounted by `offer_percent` and
/// rounded to 2 decimals, half away from zero.
pub fn price_after_offer(public_price: Decimal, offer_percent: Decimal) -> Decimal {
    (public_price * (Decimal::from(100) - offer_percent) / Decimal::from(100))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Per-store, per-product stock records with offer pricing.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Create an inventory line for a store and product. The offer price is
    /// derived from the product's public price at creation time.
    #[instrument(skip(self, request), fields(store_id = request.store_id, product_id = request.product_id))]
    pub async fn create(
        &self,
        request: CreateInventoryRequest,
    ) -> Result<product_inventory::Model, ServiceError> {
        request.validate()?;

        let product = product::Entity::find_by_id(request.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product with id {} not found",
                    request.product_id
                ))
            })?;
        store::Entity::find_by_id(request.store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Store with id {} not found", request.store_id))
            })?;

        let offer_percent = Decimal::try_from(request.offer_percent)
            .map_err(|_| ServiceError::ValidationError("invalid offer percent".to_string()))?;

        let created = product_inventory::ActiveModel {
            store_id: Set(request.store_id),
            product_id: Set(request.product_id),
            amount: Set(request.amount),
            offer_percent: Set(offer_percent),
            price_after_offer: Set(price_after_offer(product.public_price, offer_percent)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(inventory_id = created.id, "inventory line created");
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> Result<product_inventory::Model, ServiceError> {
        product_inventory::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory line with id {id} not found"))
            })
    }

    /// Update stock and/or offer. Changing the offer recomputes the derived
    /// offer price from the product's current public price.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: UpdateInventoryRequest,
    ) -> Result<product_inventory::Model, ServiceError> {
        request.validate()?;

        let inventory = self.get(id).await?;
        let product_id = inventory.product_id;
        let mut active: product_inventory::ActiveModel = inventory.into();

        if let Some(amount) = request.amount {
            active.amount = Set(amount);
        }
        if let Some(offer) = request.offer_percent {
            let offer = Decimal::try_from(offer)
                .map_err(|_| ServiceError::ValidationError("invalid offer percent".to_string()))?;
            let product = product::Entity::find_by_id(product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product with id {product_id} not found"))
                })?;
            active.offer_percent = Set(offer);
            active.price_after_offer = Set(price_after_offer(product.public_price, offer));
        }

        Ok(active.update(&*self.db).await?)
    }

    /// Products with their stock summed across all stores, optionally
    /// restricted by public-price range and category. Filters are applied
    /// before grouping.
    pub async fn filter_products(
        &self,
        filter: ProductFilter,
    ) -> Result<Vec<ProductStockRow>, ServiceError> {
        if let Some(category_id) = filter.category_id {
            category::Entity::find_by_id(category_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Category with id {category_id} not found"))
                })?;
        }

        let mut query = product_inventory::Entity::find()
            .select_only()
            .column_as(product::Column::Id, "id")
            .column(product::Column::Name)
            .column(product::Column::Image)
            .column(product::Column::UnitsPerPackage)
            .column(product::Column::PublicPrice)
            .column_as(category::Column::Name, "category")
            .column_as(product_inventory::Column::Amount.sum(), "total_amount")
            .join(
                JoinType::InnerJoin,
                product_inventory::Relation::Product.def(),
            )
            .join(JoinType::InnerJoin, product::Relation::Category.def());

        if let Some(min_price) = filter.min_price {
            query = query.filter(product::Column::PublicPrice.gte(min_price));
        }
        if let Some(max_price) = filter.max_price {
            query = query.filter(product::Column::PublicPrice.lte(max_price));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }

        Ok(query
            .group_by(product::Column::Id)
            .group_by(product::Column::Name)
            .group_by(product::Column::Image)
            .group_by(product::Column::UnitsPerPackage)
            .group_by(product::Column::PublicPrice)
            .group_by(category::Column::Name)
            .into_model::<ProductStockRow>()
            .all(&*self.db)
            .await?)
    }

    /// In-stock inventory lines with the steepest discounts.
    pub async fn hot_deals(&self) -> Result<Vec<HotDealRow>, ServiceError> {
        Ok(product_inventory::Entity::find()
            .select_only()
            .column(product_inventory::Column::Id)
            .column_as(product::Column::Name, "product_name")
            .column(product::Column::Image)
            .column(product::Column::PublicPrice)
            .column(product_inventory::Column::OfferPercent)
            .column(product_inventory::Column::PriceAfterOffer)
            .join(
                JoinType::InnerJoin,
                product_inventory::Relation::Product.def(),
            )
            .filter(product_inventory::Column::Amount.gt(0))
            .filter(product_inventory::Column::OfferPercent.gt(0))
            .order_by(product_inventory::Column::OfferPercent, SortOrder::Desc)
            .limit(HOT_DEALS_LIMIT)
            .into_model::<HotDealRow>()
            .all(&*self.db)
            .await?)
    }

    /// Count of in-stock inventory lines created in the period.
    #[instrument(skip(self))]
    pub async fn active_products_count(
        &self,
        period: AllowedPeriod,
    ) -> Result<CountStats, ServiceError> {
        let base = || {
            product_inventory::Entity::find().filter(product_inventory::Column::Amount.gt(0))
        };

        if period == AllowedPeriod::AllTime {
            let count = base().count(&*self.db).await?;
            return Ok(CountStats {
                count,
                percentage_change: 0.0,
            });
        }

        let ranges = stats::date_ranges(period, Utc::now())?;
        let current = base()
            .filter(product_inventory::Column::CreatedAt.gte(ranges.current_start))
            .filter(product_inventory::Column::CreatedAt.lte(ranges.current_end))
            .count(&*self.db)
            .await?;
        let previous = base()
            .filter(product_inventory::Column::CreatedAt.gte(ranges.previous_start))
            .filter(product_inventory::Column::CreatedAt.lt(ranges.previous_end))
            .count(&*self.db)
            .await?;

        Ok(CountStats {
            count: current,
            percentage_change: stats::percentage_change(current as f64, previous as f64),
        })
    }
}
