use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::pharmacies::{CreatePharmacyRequest, UpdatePharmacyRequest};
use crate::stats::AllowedPeriod;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pharmacies).post(create_pharmacy))
        .route("/total-count/:period", get(total_pharmacies_count))
        .route("/:id", get(get_pharmacy).patch(update_pharmacy))
        .route("/:id/status", patch(set_pharmacy_status))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    is_active: bool,
}

async fn create_pharmacy(
    State(state): State<AppState>,
    Json(payload): Json<CreatePharmacyRequest>,
) -> Result<Response, ServiceError> {
    let pharmacy = state.services.pharmacies.create(payload).await?;
    Ok(created_response(pharmacy))
}

async fn get_pharmacy(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let pharmacy = state.services.pharmacies.get(id).await?;
    Ok(success_response(pharmacy))
}

async fn list_pharmacies(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let pharmacies = state.services.pharmacies.list().await?;
    Ok(success_response(pharmacies))
}

async fn update_pharmacy(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePharmacyRequest>,
) -> Result<Response, ServiceError> {
    let pharmacy = state.services.pharmacies.update(id, payload).await?;
    Ok(success_response(pharmacy))
}

async fn set_pharmacy_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<StatusBody>,
) -> Result<Response, ServiceError> {
    let pharmacy = state
        .services
        .pharmacies
        .set_active(id, body.is_active)
        .await?;
    Ok(success_response(pharmacy))
}

async fn total_pharmacies_count(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Response, ServiceError> {
    let period = AllowedPeriod::parse(&period)?;
    let stats = state
        .services
        .pharmacies
        .total_pharmacies_count(period)
        .await?;
    Ok(success_response(stats))
}
