//! Store and pharmacy registries, catalog views and inventory management
//! over the HTTP surface.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, response_json, TestApp};
use pharmacy_api::auth::Role;
use rust_decimal_macros::dec;
use serde_json::json;

fn store_payload(user_name: &str) -> serde_json::Value {
    json!({
        "user_name": user_name,
        "store_name": format!("{user_name} store"),
        "email": format!("{user_name}@example.com"),
        "contact_number": "0100000000",
        "country": "Egypt",
        "governorate": "Cairo",
        "region": "Nasr City",
        "address": "1 Main St",
        "tax_license": "TL-9",
        "tax_card": "TC-9",
        "commercial_register": "CR-9"
    })
}

#[tokio::test]
async fn store_registration_rejects_duplicate_user_names() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/v1/stores", Some(store_payload("medico")))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["user_name"], "medico");
    assert_eq!(body["is_active"], true);

    let response = app
        .request(Method::POST, "/api/v1/stores", Some(store_payload("medico")))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn store_registration_validates_the_payload() {
    let app = TestApp::new().await;

    let mut payload = store_payload("ok-name");
    payload["email"] = json!("not-an-email");
    let response = app
        .request(Method::POST, "/api/v1/stores", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // user_name below the minimum length
    let response = app
        .request(Method::POST, "/api/v1/stores", Some(store_payload("ab")))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_search_matches_name_fragments_case_insensitively() {
    let app = TestApp::new().await;
    app.seed_store("alpha", "Cairo").await;
    app.seed_store("beta", "Giza").await;

    let body = response_json(
        app.request(Method::GET, "/api/v1/stores?name=ALPHA", None).await,
    )
    .await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["store_name"], "alpha store");

    // No filter lists everything, trimmed to the search row shape.
    let body = response_json(app.request(Method::GET, "/api/v1/stores", None).await).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert!(body[0].get("email").is_none());
}

#[tokio::test]
async fn status_toggle_conflicts_when_already_in_that_state() {
    let app = TestApp::new().await;
    let store = app.seed_store("toggleme", "Cairo").await;

    let uri = format!("/api/v1/stores/{}/status", store.id);

    // Seeded active, so activating again conflicts.
    let response = app
        .request(Method::PATCH, &uri, Some(json!({"is_active": true})))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(Method::PATCH, &uri, Some(json!({"is_active": false})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["is_active"], false);

    // Same rule applies to pharmacies.
    let pharmacy = app.seed_pharmacy("ph-toggle").await;
    let uri = format!("/api/v1/pharmacies/{}/status", pharmacy.id);
    let response = app
        .request(Method::PATCH, &uri, Some(json!({"is_active": true})))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn pharmacy_registration_rejects_duplicate_user_names() {
    let app = TestApp::new().await;

    let payload = json!({
        "user_name": "duplica",
        "pharmacy_name": "Duplica Pharmacy",
        "email": "duplica@example.com",
        "contact_number": "0110000000",
        "region": "Cairo",
        "address": "2 Side St"
    });

    let response = app
        .request(Method::POST, "/api/v1/pharmacies", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(Method::POST, "/api/v1/pharmacies", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn store_catalog_flattens_inventory_with_product_data() {
    let app = TestApp::new().await;

    let category = app.seed_category("tablets").await;
    let product = app.seed_product("metformin", dec!(8.00), category.id).await;
    let store = app.seed_store("catalogue", "Cairo").await;
    app.seed_inventory(&store, &product, 30, dec!(25)).await;

    let uri = format!("/api/v1/stores/{}/catalog", store.id);
    let body = response_json(app.request(Method::GET, &uri, None).await).await;
    let items = body.as_array().unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_name"], "metformin");
    assert_eq!(items[0]["store_name"], "catalogue store");
    assert_eq!(items[0]["dosage"], "500mg / 20 tablets");
    assert_eq!(decimal_field(&items[0], "public_price"), dec!(8.00));
    assert_eq!(decimal_field(&items[0], "price_after_offer"), dec!(6.00));

    let response = app
        .request(Method::GET, "/api/v1/stores/9999/catalog", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn top_selling_stores_rank_by_sold_line_revenue() {
    let app = TestApp::new().await;

    let category = app.seed_category("mixed").await;
    let product = app.seed_product("generic", dec!(4.00), category.id).await;
    let busy = app.seed_store("busy", "Cairo").await;
    let quiet = app.seed_store("quiet", "Cairo").await;
    let _idle = app.seed_store("idle", "Cairo").await;
    let pharmacy = app.seed_pharmacy("ranker").await;

    let busy_line = app.seed_inventory(&busy, &product, 100, dec!(0)).await;
    let quiet_line = app.seed_inventory(&quiet, &product, 100, dec!(0)).await;

    let order = app.seed_order(pharmacy.id, dec!(28.00), chrono::Utc::now()).await;
    app.seed_order_detail(order.id, busy_line.id, 6, dec!(24.00)).await;
    app.seed_order_detail(order.id, quiet_line.id, 1, dec!(4.00)).await;

    let body = response_json(
        app.request(Method::GET, "/api/v1/stores/top-selling/true", None)
            .await,
    )
    .await;
    let rows = body.as_array().unwrap();

    // The store with no sales never appears.
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], busy.id);
    assert_eq!(decimal_field(&rows[0], "total_sales"), dec!(24.00));
    assert_eq!(rows[1]["id"], quiet.id);
}

#[tokio::test]
async fn inventory_management_requires_a_store_account() {
    let app = TestApp::new().await;

    let category = app.seed_category("creams").await;
    let product = app.seed_product("ointment", dec!(8.00), category.id).await;
    let store = app.seed_store("keeper", "Cairo").await;

    let payload = json!({
        "store_id": store.id,
        "product_id": product.id,
        "amount": 40,
        "offer_percent": 25.0
    });

    let response = app
        .request(Method::POST, "/api/v1/inventory", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let pharmacy_token = app.token_for(7, Role::Pharmacy);
    let response = app
        .request_with_token(
            Method::POST,
            "/api/v1/inventory",
            &pharmacy_token,
            Some(payload.clone()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let store_token = app.token_for(store.id, Role::Store);
    let response = app
        .request_with_token(Method::POST, "/api/v1/inventory", &store_token, Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(decimal_field(&body, "price_after_offer"), dec!(6.00));

    // Changing the offer recomputes the derived price.
    let inventory_id = body["id"].as_i64().unwrap();
    let response = app
        .request_with_token(
            Method::PATCH,
            &format!("/api/v1/inventory/{inventory_id}"),
            &store_token,
            Some(json!({"offer_percent": 50.0})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(decimal_field(&body, "price_after_offer"), dec!(4.00));
}

#[tokio::test]
async fn product_listing_sums_stock_across_stores() {
    let app = TestApp::new().await;

    let cheap = app.seed_category("cheap").await;
    let dear = app.seed_category("dear").await;
    let common_product = app.seed_product("shared", dec!(4.00), cheap.id).await;
    let pricey_product = app.seed_product("pricey", dec!(64.00), dear.id).await;
    let store_a = app.seed_store("stock-a", "Cairo").await;
    let store_b = app.seed_store("stock-b", "Giza").await;

    app.seed_inventory(&store_a, &common_product, 5, dec!(0)).await;
    app.seed_inventory(&store_b, &common_product, 7, dec!(0)).await;
    app.seed_inventory(&store_a, &pricey_product, 3, dec!(0)).await;

    let body = response_json(
        app.request(Method::GET, "/api/v1/inventory/products", None).await,
    )
    .await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let shared = rows
        .iter()
        .find(|row| row["name"] == "shared")
        .expect("shared product row");
    assert_eq!(shared["total_amount"], 12);
    assert_eq!(shared["category"], "cheap");

    // Price and category filters narrow the listing.
    let body = response_json(
        app.request(Method::GET, "/api/v1/inventory/products?max_price=10", None)
            .await,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/inventory/products?category_id={}", dear.id);
    let body = response_json(app.request(Method::GET, &uri, None).await).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "pricey");

    let response = app
        .request(Method::GET, "/api/v1/inventory/products?category_id=999", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hot_deals_list_discounted_in_stock_lines_steepest_first() {
    let app = TestApp::new().await;

    let category = app.seed_category("deals").await;
    let product = app.seed_product("dealmaker", dec!(8.00), category.id).await;
    let store = app.seed_store("dealer", "Cairo").await;

    let half_off = app.seed_inventory(&store, &product, 5, dec!(50)).await;
    let quarter_off = app.seed_inventory(&store, &product, 5, dec!(25)).await;
    // Not discounted, and discounted-but-sold-out, both excluded.
    app.seed_inventory(&store, &product, 5, dec!(0)).await;
    app.seed_inventory(&store, &product, 0, dec!(75)).await;

    let body = response_json(
        app.request(Method::GET, "/api/v1/inventory/hot-deals", None).await,
    )
    .await;
    let rows = body.as_array().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], half_off.id);
    assert_eq!(decimal_field(&rows[0], "price_after_offer"), dec!(4.00));
    assert_eq!(rows[1]["id"], quarter_off.id);
}

#[tokio::test]
async fn product_and_category_crud_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({"name": "antihistamines"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let category = response_json(response).await;
    let category_id = category["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "cetirizine",
                "image": "cetirizine.png",
                "units_per_package": 30,
                "active_ingredient_mg": 10,
                "public_price": "6.00",
                "category_id": category_id
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product = response_json(response).await;
    assert_eq!(product["name"], "cetirizine");

    // Unknown category is rejected up front.
    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "orphan",
                "image": "orphan.png",
                "units_per_package": 10,
                "active_ingredient_mg": 5,
                "public_price": "2.00",
                "category_id": 999
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_json(app.request(Method::GET, "/api/v1/products", None).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
