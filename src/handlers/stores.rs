use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::handlers::common::{created_response, parse_bool_flag, success_response};
use crate::services::stores::{CreateStoreRequest, UpdateStoreRequest};
use crate::stats::AllowedPeriod;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search_stores).post(create_store))
        .route("/total-count/:period", get(total_stores_count))
        .route("/top-selling/:is_top", get(top_selling_stores))
        .route("/:id", get(get_store).patch(update_store))
        .route("/:id/status", patch(set_store_status))
        .route("/:id/catalog", get(store_catalog))
}

#[derive(Debug, Deserialize)]
struct StoreSearchQuery {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    is_active: bool,
}

async fn create_store(
    State(state): State<AppState>,
    Json(payload): Json<CreateStoreRequest>,
) -> Result<Response, ServiceError> {
    let store = state.services.stores.create(payload).await?;
    Ok(created_response(store))
}

async fn get_store(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let store = state.services.stores.get(id).await?;
    Ok(success_response(store))
}

async fn search_stores(
    State(state): State<AppState>,
    Query(query): Query<StoreSearchQuery>,
) -> Result<Response, ServiceError> {
    let stores = state.services.stores.search(query.name.as_deref()).await?;
    Ok(success_response(stores))
}

async fn update_store(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStoreRequest>,
) -> Result<Response, ServiceError> {
    let store = state.services.stores.update(id, payload).await?;
    Ok(success_response(store))
}

async fn set_store_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<StatusBody>,
) -> Result<Response, ServiceError> {
    let store = state.services.stores.set_active(id, body.is_active).await?;
    Ok(success_response(store))
}

async fn total_stores_count(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Response, ServiceError> {
    let period = AllowedPeriod::parse(&period)?;
    let stats = state.services.stores.total_stores_count(period).await?;
    Ok(success_response(stats))
}

async fn top_selling_stores(
    State(state): State<AppState>,
    Path(is_top): Path<String>,
) -> Result<Response, ServiceError> {
    let is_top = parse_bool_flag(&is_top)?;
    let rows = state.services.stores.top_or_bottom_stores(is_top).await?;
    Ok(success_response(rows))
}

async fn store_catalog(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let catalog = state.services.stores.store_catalog(id).await?;
    Ok(success_response(catalog))
}
