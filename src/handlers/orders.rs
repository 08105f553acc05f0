use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::auth::{self, AuthService, AuthUser, Role};
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, parse_bool_flag, success_response, PaginationParams,
};
use crate::services::orders::{CreateOrderRequest, OrderStatus};
use crate::stats::AllowedPeriod;
use crate::AppState;

pub fn routes(auth_service: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_order).route_layer(middleware::from_fn_with_state(
                auth_service,
                auth::require_auth,
            )),
        )
        .route("/", get(list_orders))
        .route("/latest", get(latest_orders))
        .route("/store/:store_id", get(orders_by_store))
        .route(
            "/store/:store_id/statistics/:period",
            get(store_order_statistics),
        )
        .route("/store/:store_id/sales/:period", get(store_sales_statistics))
        .route("/total-count/:period", get(total_orders_count))
        .route("/pharmacy/:id/count/:period", get(pharmacy_orders_count))
        .route(
            "/pharmacy/:id/purchases/:period",
            get(pharmacy_purchases_total),
        )
        .route("/top-buying-pharmacies/:is_top", get(top_buying_pharmacies))
        .route("/most-selling/:region", get(most_selling))
        .route("/:id", get(get_order))
        .route("/date/:date/:status", get(orders_by_date_and_status))
}

/// Place an order. The purchasing pharmacy is taken from the caller's
/// token; only pharmacy accounts may order.
async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Response, ServiceError> {
    auth::authorize(&user, &[Role::Pharmacy])?;

    let order = state.services.orders.create_order(user.id, payload).await?;
    Ok(created_response(order))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(success_response(order))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let orders = state
        .services
        .orders
        .list_orders(pagination.page, pagination.per_page)
        .await?;
    Ok(success_response(orders))
}

async fn latest_orders(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let orders = state.services.orders.latest_orders(10).await?;
    Ok(success_response(orders))
}

async fn orders_by_store(
    State(state): State<AppState>,
    Path(store_id): Path<i32>,
) -> Result<Response, ServiceError> {
    let orders = state.services.orders.orders_by_store(store_id).await?;
    Ok(success_response(orders))
}

async fn orders_by_date_and_status(
    State(state): State<AppState>,
    Path((date, status)): Path<(String, String)>,
) -> Result<Response, ServiceError> {
    let date = date.parse::<NaiveDate>().map_err(|_| {
        ServiceError::ValidationError(format!("invalid date '{date}', expected YYYY-MM-DD"))
    })?;
    let status = status.parse::<OrderStatus>().map_err(|_| {
        ServiceError::ValidationError(format!("invalid order status '{status}'"))
    })?;

    let orders = state
        .services
        .orders
        .orders_by_date_and_status(date, status)
        .await?;
    Ok(success_response(orders))
}

async fn total_orders_count(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Response, ServiceError> {
    let period = AllowedPeriod::parse(&period)?;
    let stats = state.services.orders.total_orders_count(None, period).await?;
    Ok(success_response(stats))
}

async fn pharmacy_orders_count(
    State(state): State<AppState>,
    Path((id, period)): Path<(i32, String)>,
) -> Result<Response, ServiceError> {
    let period = AllowedPeriod::parse(&period)?;
    let stats = state
        .services
        .orders
        .total_orders_count(Some(id), period)
        .await?;
    Ok(success_response(stats))
}

async fn pharmacy_purchases_total(
    State(state): State<AppState>,
    Path((id, period)): Path<(i32, String)>,
) -> Result<Response, ServiceError> {
    let period = AllowedPeriod::parse(&period)?;
    let stats = state
        .services
        .orders
        .pharmacy_purchases_total(id, period)
        .await?;
    Ok(success_response(stats))
}

async fn store_order_statistics(
    State(state): State<AppState>,
    Path((store_id, period)): Path<(i32, String)>,
) -> Result<Response, ServiceError> {
    let period = AllowedPeriod::parse(&period)?;
    let stats = state
        .services
        .orders
        .store_order_statistics(store_id, period)
        .await?;
    Ok(success_response(stats))
}

async fn store_sales_statistics(
    State(state): State<AppState>,
    Path((store_id, period)): Path<(i32, String)>,
) -> Result<Response, ServiceError> {
    let period = AllowedPeriod::parse(&period)?;
    let stats = state
        .services
        .orders
        .store_sales_statistics(store_id, period)
        .await?;
    Ok(success_response(stats))
}

async fn top_buying_pharmacies(
    State(state): State<AppState>,
    Path(is_top): Path<String>,
) -> Result<Response, ServiceError> {
    let is_top = parse_bool_flag(&is_top)?;
    let rows = state.services.orders.top_buying_pharmacies(is_top).await?;
    Ok(success_response(rows))
}

async fn most_selling(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Response, ServiceError> {
    let rows = state.services.orders.most_sold_inventory(&region).await?;
    Ok(success_response(rows))
}
