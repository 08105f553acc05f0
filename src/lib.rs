//! Pharmacy ordering backend: stores list product inventory, pharmacies
//! place orders, and dashboards read sales statistics over configurable
//! reporting periods.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod services;
pub mod stats;

pub use errors::ServiceError;
pub use handlers::AppServices;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<db::DbPool>, config: config::AppConfig) -> Self {
        let services = AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// All v1 API routes, nested by resource.
pub fn api_routes(auth_service: Arc<auth::AuthService>) -> Router<AppState> {
    Router::new()
        .nest("/orders", handlers::orders::routes(auth_service.clone()))
        .nest("/stores", handlers::stores::routes())
        .nest("/pharmacies", handlers::pharmacies::routes())
        .nest("/inventory", handlers::inventory::routes(auth_service))
        .nest("/products", handlers::products::routes())
        .nest("/categories", handlers::products::category_routes())
}

/// Build the full application router with tracing applied.
pub fn app(state: AppState, auth_service: Arc<auth::AuthService>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api/v1", api_routes(auth_service))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
