use crate::{
    db::DbPool,
    entities::{category, product},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub image: String,
    #[validate(range(min = 1))]
    pub units_per_package: i32,
    #[validate(range(min = 1))]
    pub active_ingredient_mg: i32,
    pub public_price: Decimal,
    pub category_id: i32,
}

/// Read-mostly catalog of products.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        if request.public_price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "public price must be positive".to_string(),
            ));
        }

        category::Entity::find_by_id(request.category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Category with id {} not found",
                    request.category_id
                ))
            })?;

        Ok(product::ActiveModel {
            name: Set(request.name),
            image: Set(request.image),
            units_per_package: Set(request.units_per_package),
            active_ingredient_mg: Set(request.active_ingredient_mg),
            public_price: Set(request.public_price),
            category_id: Set(request.category_id),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?)
    }

    pub async fn get(&self, id: i32) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with id {id} not found")))
    }

    pub async fn list(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find().all(&*self.db).await?)
    }
}
