use crate::{
    db::DbPool,
    entities::{order, order_detail, pharmacy, product, product_inventory, store},
    errors::ServiceError,
    stats::{self, AllowedPeriod, CostStats, CountStats},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, Order as SortOrder,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

/// Payment methods accepted at order submission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
}

/// Lifecycle states of an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirm,
    Delivered,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    /// Inventory lines being purchased, parallel to `quantities`
    #[validate(length(min = 1, message = "at least one inventory line is required"))]
    pub product_inventory_ids: Vec<i32>,
    #[validate(length(min = 1, message = "at least one quantity is required"))]
    pub quantities: Vec<i32>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDetailResponse {
    pub id: i32,
    pub product_inventory_id: i32,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: i32,
    pub pharmacy_id: i32,
    pub payment_method: String,
    pub status: String,
    pub total_cost: Decimal,
    pub created_at: chrono::DateTime<Utc>,
    pub details: Vec<OrderDetailResponse>,
}

impl OrderResponse {
    fn from_parts(order: order::Model, details: Vec<order_detail::Model>) -> Self {
        Self {
            id: order.id,
            pharmacy_id: order.pharmacy_id,
            payment_method: order.payment_method,
            status: order.status,
            total_cost: order.total_cost,
            created_at: order.created_at,
            details: details
                .into_iter()
                .map(|d| OrderDetailResponse {
                    id: d.id,
                    product_inventory_id: d.product_inventory_id,
                    quantity: d.quantity,
                    price: d.price,
                })
                .collect(),
        }
    }
}

/// Pharmacy ranked by total spend across all its orders.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct TopPharmacyRow {
    pub id: i32,
    pub pharmacy_name: String,
    pub region: String,
    pub total_spent: Decimal,
}

/// Best-selling inventory line within a region.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct MostSoldRow {
    pub product_inventory_id: i32,
    pub product_name: String,
    pub image: String,
    pub total_quantity: i64,
}

/// Store sales totals for a reporting window.
#[derive(Debug, Serialize, Deserialize)]
pub struct SalesStats {
    pub current_period_total: Decimal,
    pub previous_period_total: Decimal,
    pub change_rate: f64,
}

const TOP_LIMIT: u64 = 5;

/// Order placement and order reporting.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates an order for a pharmacy: one detail line per inventory line,
    /// decrementing stock as it goes.
    ///
    /// Every line is validated before any write, and all writes run inside
    /// a single transaction. A failure on any line leaves every inventory
    /// row untouched.
    #[instrument(skip(self, request), fields(pharmacy_id = pharmacy_id))]
    pub async fn create_order(
        &self,
        pharmacy_id: i32,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        if request.product_inventory_ids.len() != request.quantities.len() {
            return Err(ServiceError::ValidationError(
                "the number of inventory lines and quantities do not match".to_string(),
            ));
        }
        if request.quantities.iter().any(|qty| *qty <= 0) {
            return Err(ServiceError::ValidationError(
                "quantities must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let pharmacy = pharmacy::Entity::find_by_id(pharmacy_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Pharmacy with id {pharmacy_id} not found"))
            })?;

        // Validate all lines and price them before touching any row.
        let mut lines: Vec<(product_inventory::Model, i32, Decimal)> = Vec::new();
        let mut total_cost = Decimal::ZERO;
        for (&inventory_id, &quantity) in request
            .product_inventory_ids
            .iter()
            .zip(request.quantities.iter())
        {
            let inventory = product_inventory::Entity::find_by_id(inventory_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Inventory line with id {inventory_id} not found"
                    ))
                })?;

            if inventory.amount < quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "requested {quantity} of inventory line {inventory_id} but only {} available",
                    inventory.amount
                )));
            }

            let price = inventory.price_after_offer * Decimal::from(quantity);
            total_cost += price;
            lines.push((inventory, quantity, price));
        }

        let order = order::ActiveModel {
            pharmacy_id: Set(pharmacy.id),
            payment_method: Set(request
                .payment_method
                .unwrap_or(PaymentMethod::Cash)
                .to_string()),
            status: Set(OrderStatus::Confirm.to_string()),
            total_cost: Set(total_cost),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut details = Vec::with_capacity(lines.len());
        for (inventory, quantity, price) in lines {
            let detail = order_detail::ActiveModel {
                order_id: Set(order.id),
                product_inventory_id: Set(inventory.id),
                quantity: Set(quantity),
                price: Set(price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            details.push(detail);

            // Guarded decrement: the amount check is re-evaluated in SQL so
            // a concurrent order on the same line cannot oversell it.
            let updated = product_inventory::Entity::update_many()
                .col_expr(
                    product_inventory::Column::Amount,
                    Expr::col(product_inventory::Column::Amount).sub(quantity),
                )
                .filter(product_inventory::Column::Id.eq(inventory.id))
                .filter(product_inventory::Column::Amount.gte(quantity))
                .exec(&txn)
                .await?;
            if updated.rows_affected == 0 {
                return Err(ServiceError::InsufficientStock(format!(
                    "inventory line {} no longer has {quantity} in stock",
                    inventory.id
                )));
            }
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = order.id, "failed to commit order transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = order.id,
            pharmacy_id = pharmacy.id,
            total_cost = %order.total_cost,
            "order created"
        );

        Ok(OrderResponse::from_parts(order, details))
    }

    /// Fetch one order with its detail lines.
    pub async fn get_order(&self, id: i32) -> Result<OrderResponse, ServiceError> {
        let mut found = order::Entity::find_by_id(id)
            .find_with_related(order_detail::Entity)
            .all(&*self.db)
            .await?;

        match found.pop() {
            Some((order, details)) => Ok(OrderResponse::from_parts(order, details)),
            None => Err(ServiceError::NotFound(format!(
                "Order with id {id} not found"
            ))),
        }
    }

    /// List orders newest-first, one page at a time. `page` is 1-based.
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<Vec<order::Model>, ServiceError> {
        let paginator = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.clamp(1, 100));

        Ok(paginator.fetch_page(page.saturating_sub(1)).await?)
    }

    /// Orders containing at least one line from the given store's inventory.
    pub async fn orders_by_store(&self, store_id: i32) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .join(JoinType::InnerJoin, order::Relation::OrderDetail.def())
            .join(
                JoinType::InnerJoin,
                order_detail::Relation::ProductInventory.def(),
            )
            .filter(product_inventory::Column::StoreId.eq(store_id))
            .distinct()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Orders placed on a calendar day with a given status.
    pub async fn orders_by_date_and_status(
        &self,
        date: NaiveDate,
        status: OrderStatus,
    ) -> Result<Vec<order::Model>, ServiceError> {
        let start = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ServiceError::ValidationError("invalid date".to_string()))?
            .and_utc();
        let end = start + chrono::Duration::days(1);

        Ok(order::Entity::find()
            .filter(order::Column::Status.eq(status.to_string()))
            .filter(order::Column::CreatedAt.gte(start))
            .filter(order::Column::CreatedAt.lt(end))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn latest_orders(&self, limit: u64) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }

    /// Total order count for the period, over all pharmacies or one of them.
    #[instrument(skip(self))]
    pub async fn total_orders_count(
        &self,
        pharmacy_id: Option<i32>,
        period: AllowedPeriod,
    ) -> Result<CountStats, ServiceError> {
        let base = || {
            let mut query = order::Entity::find();
            if let Some(id) = pharmacy_id {
                query = query.filter(order::Column::PharmacyId.eq(id));
            }
            query
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
            .filter(order::Column::CreatedAt.gte(ranges.current_start))
            .filter(order::Column::CreatedAt.lte(ranges.current_end))
            .count(&*self.db)
            .await?;
        let previous = base()
            .filter(order::Column::CreatedAt.gte(ranges.previous_start))
            .filter(order::Column::CreatedAt.lt(ranges.previous_end))
            .count(&*self.db)
            .await?;

        Ok(CountStats {
            count: current,
            percentage_change: stats::percentage_change(current as f64, previous as f64),
        })
    }

    /// Total spend of one pharmacy for the period.
    #[instrument(skip(self))]
    pub async fn pharmacy_purchases_total(
        &self,
        pharmacy_id: i32,
        period: AllowedPeriod,
    ) -> Result<CostStats, ServiceError> {
        let sum_for = |window: Option<(chrono::DateTime<Utc>, chrono::DateTime<Utc>, bool)>| {
            let mut query = order::Entity::find()
                .select_only()
                .column_as(order::Column::TotalCost.sum(), "total")
                .filter(order::Column::PharmacyId.eq(pharmacy_id));
            if let Some((start, end, end_inclusive)) = window {
                query = query.filter(order::Column::CreatedAt.gte(start));
                query = if end_inclusive {
                    query.filter(order::Column::CreatedAt.lte(end))
                } else {
                    query.filter(order::Column::CreatedAt.lt(end))
                };
            }
            query.into_tuple::<Option<Decimal>>().one(&*self.db)
        };

        if period == AllowedPeriod::AllTime {
            let cost = sum_for(None).await?.flatten().unwrap_or(Decimal::ZERO);
            return Ok(CostStats {
                cost,
                percentage_change: 0.0,
            });
        }

        let ranges = stats::date_ranges(period, Utc::now())?;
        let current = sum_for(Some((ranges.current_start, ranges.current_end, true)))
            .await?
            .flatten()
            .unwrap_or(Decimal::ZERO);
        let previous = sum_for(Some((ranges.previous_start, ranges.previous_end, false)))
            .await?
            .flatten()
            .unwrap_or(Decimal::ZERO);

        Ok(CostStats {
            cost: current,
            percentage_change: stats::percentage_change(
                current.to_f64().unwrap_or(0.0),
                previous.to_f64().unwrap_or(0.0),
            ),
        })
    }

    /// Count of orders touching one store's inventory, per period.
    #[instrument(skip(self))]
    pub async fn store_order_statistics(
        &self,
        store_id: i32,
        period: AllowedPeriod,
    ) -> Result<CountStats, ServiceError> {
        let base = || {
            order::Entity::find()
                .join(JoinType::InnerJoin, order::Relation::OrderDetail.def())
                .join(
                    JoinType::InnerJoin,
                    order_detail::Relation::ProductInventory.def(),
                )
                .filter(product_inventory::Column::StoreId.eq(store_id))
                .distinct()
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
            .filter(order::Column::CreatedAt.gte(ranges.current_start))
            .filter(order::Column::CreatedAt.lte(ranges.current_end))
            .count(&*self.db)
            .await?;
        let previous = base()
            .filter(order::Column::CreatedAt.gte(ranges.previous_start))
            .filter(order::Column::CreatedAt.lt(ranges.previous_end))
            .count(&*self.db)
            .await?;

        Ok(CountStats {
            count: current,
            percentage_change: stats::percentage_change(current as f64, previous as f64),
        })
    }

    /// Sales revenue of one store (sum of its sold line prices), current vs
    /// previous window.
    #[instrument(skip(self))]
    pub async fn store_sales_statistics(
        &self,
        store_id: i32,
        period: AllowedPeriod,
    ) -> Result<SalesStats, ServiceError> {
        let sum_for = |window: Option<(chrono::DateTime<Utc>, chrono::DateTime<Utc>, bool)>| {
            let mut query = order_detail::Entity::find()
                .select_only()
                .column_as(order_detail::Column::Price.sum(), "total")
                .join(
                    JoinType::InnerJoin,
                    order_detail::Relation::ProductInventory.def(),
                )
                .join(JoinType::InnerJoin, order_detail::Relation::Order.def())
                .filter(product_inventory::Column::StoreId.eq(store_id));
            if let Some((start, end, end_inclusive)) = window {
                query = query.filter(order::Column::CreatedAt.gte(start));
                query = if end_inclusive {
                    query.filter(order::Column::CreatedAt.lte(end))
                } else {
                    query.filter(order::Column::CreatedAt.lt(end))
                };
            }
            query.into_tuple::<Option<Decimal>>().one(&*self.db)
        };

        if period == AllowedPeriod::AllTime {
            let total = sum_for(None).await?.flatten().unwrap_or(Decimal::ZERO);
            return Ok(SalesStats {
                current_period_total: total,
                previous_period_total: Decimal::ZERO,
                change_rate: 0.0,
            });
        }

        let ranges = stats::date_ranges(period, Utc::now())?;
        let current = sum_for(Some((ranges.current_start, ranges.current_end, true)))
            .await?
            .flatten()
            .unwrap_or(Decimal::ZERO);
        let previous = sum_for(Some((ranges.previous_start, ranges.previous_end, false)))
            .await?
            .flatten()
            .unwrap_or(Decimal::ZERO);

        Ok(SalesStats {
            current_period_total: current,
            previous_period_total: previous,
            change_rate: stats::percentage_change(
                current.to_f64().unwrap_or(0.0),
                previous.to_f64().unwrap_or(0.0),
            ),
        })
    }

    /// Top (or bottom) 5 pharmacies by total order spend, excluding
    /// pharmacies with no spend.
    pub async fn top_buying_pharmacies(
        &self,
        is_top: bool,
    ) -> Result<Vec<TopPharmacyRow>, ServiceError> {
        let direction = if is_top {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };

        Ok(pharmacy::Entity::find()
            .select_only()
            .column(pharmacy::Column::Id)
            .column(pharmacy::Column::PharmacyName)
            .column(pharmacy::Column::Region)
            .column_as(order::Column::TotalCost.sum(), "total_spent")
            .join(JoinType::InnerJoin, pharmacy::Relation::Order.def())
            .group_by(pharmacy::Column::Id)
            .group_by(pharmacy::Column::PharmacyName)
            .group_by(pharmacy::Column::Region)
            .having(Expr::expr(order::Column::TotalCost.sum()).gt(0))
            .order_by(order::Column::TotalCost.sum(), direction)
            .limit(TOP_LIMIT)
            .into_model::<TopPharmacyRow>()
            .all(&*self.db)
            .await?)
    }

    /// Best-selling inventory lines for stores in a region, by units sold.
    pub async fn most_sold_inventory(
        &self,
        region: &str,
    ) -> Result<Vec<MostSoldRow>, ServiceError> {
        Ok(order_detail::Entity::find()
            .select_only()
            .column(order_detail::Column::ProductInventoryId)
            .column_as(product::Column::Name, "product_name")
            .column(product::Column::Image)
            .column_as(order_detail::Column::Quantity.sum(), "total_quantity")
            .join(
                JoinType::InnerJoin,
                order_detail::Relation::ProductInventory.def(),
            )
            .join(JoinType::InnerJoin, product_inventory::Relation::Store.def())
            .join(
                JoinType::InnerJoin,
                product_inventory::Relation::Product.def(),
            )
            .filter(store::Column::Region.eq(region))
            .group_by(order_detail::Column::ProductInventoryId)
            .group_by(product::Column::Name)
            .group_by(product::Column::Image)
            .order_by(order_detail::Column::Quantity.sum(), SortOrder::Desc)
            .limit(TOP_LIMIT)
            .into_model::<MostSoldRow>()
            .all(&*self.db)
            .await?)
    }
}
