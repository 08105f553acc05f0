use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Response,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use std::sync::Arc;

use crate::auth::{self, AuthService, AuthUser, Role};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::inventory::{CreateInventoryRequest, ProductFilter, UpdateInventoryRequest};
use crate::stats::AllowedPeriod;
use crate::AppState;

pub fn routes(auth_service: Arc<AuthService>) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_inventory))
        .route("/:id", patch(update_inventory))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            auth::require_auth,
        ));

    Router::new()
        .route("/products", get(filter_products))
        .route("/hot-deals", get(hot_deals))
        .route("/active-products-count/:period", get(active_products_count))
        .route("/:id", get(get_inventory))
        .merge(protected)
}

/// Only store accounts manage their inventory lines.
async fn create_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateInventoryRequest>,
) -> Result<Response, ServiceError> {
    auth::authorize(&user, &[Role::Store, Role::Admin])?;

    let inventory = state.services.inventory.create(payload).await?;
    Ok(created_response(inventory))
}

async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let inventory = state.services.inventory.get(id).await?;
    Ok(success_response(inventory))
}

async fn update_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> Result<Response, ServiceError> {
    auth::authorize(&user, &[Role::Store, Role::Admin])?;

    let inventory = state.services.inventory.update(id, payload).await?;
    Ok(success_response(inventory))
}

async fn filter_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Response, ServiceError> {
    let rows = state.services.inventory.filter_products(filter).await?;
    Ok(success_response(rows))
}

async fn hot_deals(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let rows = state.services.inventory.hot_deals().await?;
    Ok(success_response(rows))
}

async fn active_products_count(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Response, ServiceError> {
    let period = AllowedPeriod::parse(&period)?;
    let stats = state.services.inventory.active_products_count(period).await?;
    Ok(success_response(stats))
}
