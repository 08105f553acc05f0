use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Schema, Set};
use serde_json::Value;
use tower::ServiceExt;

use pharmacy_api::{
    auth::{AuthConfig, AuthService, Role},
    config::AppConfig,
    db::{self, DbConfig},
    entities::{category, order, order_detail, pharmacy, product, product_inventory, store},
    services::inventory::price_after_offer,
    AppState,
};

const TEST_JWT_SECRET: &str = "integration_test_secret_key_0123456789abcdef";

/// Test harness: application router backed by a fresh in-memory SQLite
/// database with the schema created from the entities.
pub struct TestApp {
    router: Router,
    pub db: Arc<sea_orm::DatabaseConnection>,
    auth: Arc<AuthService>,
}

impl TestApp {
    pub async fn new() -> Self {
        // A single connection keeps every statement on the same in-memory DB.
        let db_config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to open test database");

        let backend = pool.get_database_backend();
        let schema = Schema::new(backend);
        let statements = [
            schema.create_table_from_entity(category::Entity),
            schema.create_table_from_entity(product::Entity),
            schema.create_table_from_entity(store::Entity),
            schema.create_table_from_entity(pharmacy::Entity),
            schema.create_table_from_entity(product_inventory::Entity),
            schema.create_table_from_entity(order::Entity),
            schema.create_table_from_entity(order_detail::Entity),
        ];
        for statement in statements {
            pool.execute(backend.build(&statement))
                .await
                .expect("failed to create table");
        }

        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "test".to_string(),
        );

        let auth = Arc::new(AuthService::new(AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            token_expiration_secs: 3600,
        }));

        let db = Arc::new(pool);
        let state = AppState::new(db.clone(), cfg);
        let router = pharmacy_api::app(state, auth.clone());

        Self { router, db, auth }
    }

    pub fn token_for(&self, account_id: i32, role: Role) -> String {
        self.auth
            .generate_token(account_id, role)
            .expect("failed to issue test token")
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.send(method, uri, body, None).await
    }

    pub async fn request_with_token(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> Response {
        self.send(method, uri, body, Some(token)).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    // Seed helpers insert rows directly, bypassing the HTTP surface.

    pub async fn seed_category(&self, name: &str) -> category::Model {
        category::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed category")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        public_price: Decimal,
        category_id: i32,
    ) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            image: Set(format!("{name}.png")),
            units_per_package: Set(20),
            active_ingredient_mg: Set(500),
            public_price: Set(public_price),
            category_id: Set(category_id),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed product")
    }

    pub async fn seed_store(&self, user_name: &str, region: &str) -> store::Model {
        store::ActiveModel {
            user_name: Set(user_name.to_string()),
            store_name: Set(format!("{user_name} store")),
            email: Set(format!("{user_name}@example.com")),
            contact_number: Set("0100000000".to_string()),
            country: Set("Egypt".to_string()),
            governorate: Set("Cairo".to_string()),
            region: Set(region.to_string()),
            address: Set("1 Main St".to_string()),
            tax_license: Set("TL-1".to_string()),
            tax_card: Set("TC-1".to_string()),
            commercial_register: Set("CR-1".to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed store")
    }

    pub async fn seed_pharmacy(&self, user_name: &str) -> pharmacy::Model {
        pharmacy::ActiveModel {
            user_name: Set(user_name.to_string()),
            pharmacy_name: Set(format!("{user_name} pharmacy")),
            email: Set(format!("{user_name}@example.com")),
            contact_number: Set("0110000000".to_string()),
            region: Set("Cairo".to_string()),
            address: Set("2 Side St".to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed pharmacy")
    }

    pub async fn seed_inventory(
        &self,
        store: &store::Model,
        product: &product::Model,
        amount: i32,
        offer_percent: Decimal,
    ) -> product_inventory::Model {
        product_inventory::ActiveModel {
            store_id: Set(store.id),
            product_id: Set(product.id),
            amount: Set(amount),
            offer_percent: Set(offer_percent),
            price_after_offer: Set(price_after_offer(product.public_price, offer_percent)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed inventory")
    }

    pub async fn seed_order(
        &self,
        pharmacy_id: i32,
        total_cost: Decimal,
        created_at: DateTime<Utc>,
    ) -> order::Model {
        order::ActiveModel {
            pharmacy_id: Set(pharmacy_id),
            payment_method: Set("CASH".to_string()),
            status: Set("CONFIRM".to_string()),
            total_cost: Set(total_cost),
            created_at: Set(created_at),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed order")
    }

    pub async fn seed_order_detail(
        &self,
        order_id: i32,
        inventory_id: i32,
        quantity: i32,
        price: Decimal,
    ) -> order_detail::Model {
        order_detail::ActiveModel {
            order_id: Set(order_id),
            product_inventory_id: Set(inventory_id),
            quantity: Set(quantity),
            price: Set(price),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("seed order detail")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Decimal JSON fields serialize as strings; compare them numerically.
pub fn decimal_field(value: &Value, field: &str) -> Decimal {
    value[field]
        .as_str()
        .unwrap_or_else(|| panic!("missing decimal field '{field}' in {value}"))
        .parse()
        .expect("decimal parse")
}

#[allow(dead_code)]
pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
