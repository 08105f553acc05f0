use crate::{
    db::DbPool,
    entities::pharmacy,
    errors::ServiceError,
    stats::{self, AllowedPeriod, CountStats},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePharmacyRequest {
    #[validate(length(min = 3, max = 50))]
    pub user_name: String,
    #[validate(length(min = 1, max = 100))]
    pub pharmacy_name: String,
    #[validate(email)]
    pub email: String,
    pub contact_number: String,
    pub region: String,
    pub address: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePharmacyRequest {
    #[validate(length(min = 1, max = 100))]
    pub pharmacy_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
}

/// Pharmacy account registry.
#[derive(Clone)]
pub struct PharmacyService {
    db: Arc<DbPool>,
}

impl PharmacyService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_name = %request.user_name))]
    pub async fn create(
        &self,
        request: CreatePharmacyRequest,
    ) -> Result<pharmacy::Model, ServiceError> {
        request.validate()?;

        let existing = pharmacy::Entity::find()
            .filter(pharmacy::Column::UserName.eq(request.user_name.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "pharmacy with user name '{}' already exists",
                request.user_name
            )));
        }

        let created = pharmacy::ActiveModel {
            user_name: Set(request.user_name),
            pharmacy_name: Set(request.pharmacy_name),
            email: Set(request.email),
            contact_number: Set(request.contact_number),
            region: Set(request.region),
            address: Set(request.address),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(pharmacy_id = created.id, "pharmacy registered");
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> Result<pharmacy::Model, ServiceError> {
        pharmacy::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Pharmacy with id {id} not found")))
    }

    pub async fn list(&self) -> Result<Vec<pharmacy::Model>, ServiceError> {
        Ok(pharmacy::Entity::find().all(&*self.db).await?)
    }

    pub async fn update(
        &self,
        id: i32,
        request: UpdatePharmacyRequest,
    ) -> Result<pharmacy::Model, ServiceError> {
        request.validate()?;

        let pharmacy = self.get(id).await?;
        let mut active: pharmacy::ActiveModel = pharmacy.into();

        if let Some(pharmacy_name) = request.pharmacy_name {
            active.pharmacy_name = Set(pharmacy_name);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(contact_number) = request.contact_number {
            active.contact_number = Set(contact_number);
        }
        if let Some(region) = request.region {
            active.region = Set(region);
        }
        if let Some(address) = request.address {
            active.address = Set(address);
        }

        Ok(active.update(&*self.db).await?)
    }

    /// Flip the activation flag. Setting the current value is a conflict.
    #[instrument(skip(self))]
    pub async fn set_active(&self, id: i32, active: bool) -> Result<pharmacy::Model, ServiceError> {
        let pharmacy = self.get(id).await?;

        if pharmacy.is_active == active {
            let state = if active { "active" } else { "inactive" };
            return Err(ServiceError::Conflict(format!(
                "pharmacy with id {id} is already {state}"
            )));
        }

        let mut model: pharmacy::ActiveModel = pharmacy.into();
        model.is_active = Set(active);
        let updated = model.update(&*self.db).await?;

        info!(pharmacy_id = id, is_active = active, "pharmacy status updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn total_pharmacies_count(
        &self,
        period: AllowedPeriod,
    ) -> Result<CountStats, ServiceError> {
        if period == AllowedPeriod::AllTime {
            let count = pharmacy::Entity::find().count(&*self.db).await?;
            return Ok(CountStats {
                count,
                percentage_change: 0.0,
            });
        }

        let ranges = stats::date_ranges(period, Utc::now())?;
        let current = pharmacy::Entity::find()
            .filter(pharmacy::Column::CreatedAt.gte(ranges.current_start))
            .filter(pharmacy::Column::CreatedAt.lte(ranges.current_end))
            .count(&*self.db)
            .await?;
        let previous = pharmacy::Entity::find()
            .filter(pharmacy::Column::CreatedAt.gte(ranges.previous_start))
            .filter(pharmacy::Column::CreatedAt.lt(ranges.previous_end))
            .count(&*self.db)
            .await?;

        Ok(CountStats {
            count: current,
            percentage_change: stats::percentage_change(current as f64, previous as f64),
        })
    }
}
