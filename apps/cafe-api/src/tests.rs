//! Router tests: the full axum stack against an in-memory database.

use std::collections::HashSet;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use cafe_core::{DiscountKind, Money, Product, Promotion};
use cafe_db::{Database, DbConfig};

use crate::auth::Claims;
use crate::config::ApiConfig;
use crate::{build_router, AppState};

// =============================================================================
// Harness
// =============================================================================

fn test_config(jwt_secret: Option<&str>) -> ApiConfig {
    let secret = jwt_secret.map(str::to_string);
    ApiConfig::from_lookup(|key| match key {
        "CAFE_DB_PATH" => Some(":memory:".to_string()),
        "CAFE_STORE_NAME" => Some("Test Café".to_string()),
        "CAFE_JWT_SECRET" => secret.clone(),
        _ => None,
    })
    .unwrap()
}

async fn setup_with(jwt_secret: Option<&str>) -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let catalog = db.catalog();
    for (id, name, price, active) in [
        ("latte", "Latte", 25_000, true),
        ("tea", "Peach tea", 40_000, true),
        ("old", "Retired blend", 30_000, false),
        ("gold", "Gold leaf latte", i64::MAX / 2, true),
    ] {
        catalog
            .insert_product(&Product {
                id: id.to_string(),
                name: name.to_string(),
                category: None,
                price: Money::from_minor(price),
                is_active: active,
            })
            .await
            .unwrap();
    }

    let now = Utc::now();
    db.promotions()
        .insert(&Promotion {
            id: "promo-10".to_string(),
            name: "10% off".to_string(),
            kind: DiscountKind::Percentage,
            value: 1000,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: true,
        })
        .await
        .unwrap();

    build_router(AppState::new(db, &test_config(jwt_secret)))
}

async fn setup() -> Router {
    setup_with(None).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, body, None).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn create_reference_order(app: &Router) -> String {
    let (status, order) = send(
        app,
        Method::POST,
        "/api/orders",
        Some(json!({
            "channel": "dine_in",
            "table": { "id": "t1", "name": "Table 1" },
            "staff": { "id": "lan", "name": "Lan" },
            "items": [
                { "productId": "latte", "quantity": 2 },
                { "productId": "tea", "quantity": 1 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    order["id"].as_str().unwrap().to_string()
}

fn today() -> String {
    Utc::now().date_naive().to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = setup().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_order_lifecycle_and_reports() {
    let app = setup().await;
    let id = create_reference_order(&app).await;

    let (status, order) = send(&app, Method::GET, &format!("/api/orders/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["lines"].as_array().unwrap().len(), 2);
    assert_eq!(order["lines"][0]["name"], "Latte");
    assert_eq!(order["lines"][0]["unitPrice"], 25_000);

    let (_, totals) = send(&app, Method::GET, &format!("/api/orders/{}/totals", id), None).await;
    assert_eq!(totals["subtotal"], 90_000);
    assert_eq!(totals["grandTotal"], 90_000);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{}/promotion", id),
        Some(json!({ "promotionId": "promo-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, totals) = send(&app, Method::GET, &format!("/api/orders/{}/totals", id), None).await;
    assert_eq!(totals["discount"], 9_000);
    assert_eq!(totals["grandTotal"], 81_000);
    assert_eq!(totals["appliedPromotionId"], "promo-10");

    let (status, paid) = send(
        &app,
        Method::POST,
        &format!("/api/orders/{}/status", id),
        Some(json!({ "status": "paid", "paymentMethod": "cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["paymentMethod"], "cash");

    // Paid orders are locked
    let (status, err) = send(
        &app,
        Method::POST,
        &format!("/api/orders/{}/items", id),
        Some(json!({ "productId": "latte", "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["code"], "BUSINESS_LOGIC");

    let range = format!("from={}&to={}", today(), today());

    let (status, summary) =
        send(&app, Method::GET, &format!("/api/reports/summary?{}", range), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["orderCount"], 1);
    assert_eq!(summary["revenue"], 81_000);
    assert_eq!(summary["discounts"], 9_000);

    let (_, products) = send(
        &app,
        Method::GET,
        &format!("/api/reports/products?{}&sort=quantity&direction=desc", range),
        None,
    )
    .await;
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["productId"], "latte");
    assert_eq!(products[0]["quantitySold"], 2);
    assert_eq!(products[1]["productId"], "tea");
    assert_eq!(products[1]["quantitySold"], 1);

    let (_, promotions) = send(
        &app,
        Method::GET,
        &format!("/api/reports/promotions?{}", range),
        None,
    )
    .await;
    assert_eq!(promotions[0]["promotionId"], "promo-10");
    assert_eq!(promotions[0]["orderCount"], 1);
    assert_eq!(promotions[0]["totalDiscount"], 9_000);
}

#[tokio::test]
async fn test_add_item_and_payment_method_flow() {
    let app = setup().await;
    let (_, order) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({ "channel": "takeaway" })),
    )
    .await;
    let id = order["id"].as_str().unwrap().to_string();
    assert!(order["lines"].as_array().unwrap().is_empty());

    let (status, order) = send(
        &app,
        Method::POST,
        &format!("/api/orders/{}/items", id),
        Some(json!({ "productId": "tea", "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["lines"][0]["quantity"], 3);

    // Paying without a method is refused
    let (status, err) = send(
        &app,
        Method::POST,
        &format!("/api/orders/{}/status", id),
        Some(json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["code"], "BUSINESS_LOGIC");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{}/payment-method", id),
        Some(json!({ "paymentMethod": "e_wallet" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, order) = send(
        &app,
        Method::POST,
        &format!("/api/orders/{}/status", id),
        Some(json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["paymentMethod"], "e_wallet");

    // Stored state matches what the handler returned
    let (_, stored) = send(&app, Method::GET, &format!("/api/orders/{}", id), None).await;
    assert_eq!(stored["status"], "paid");
    assert_eq!(stored["lines"].as_array().unwrap().len(), 1);

    // Terminal states are final
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/orders/{}/status", id),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_bill_views() {
    let app = setup().await;
    let id = create_reference_order(&app).await;

    let (status, bill) = send(&app, Method::GET, &format!("/api/orders/{}/bill", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bill["store"]["name"], "Test Café");
    assert_eq!(bill["lines"][0]["name"], "Latte");
    assert_eq!(bill["lines"][1]["name"], "Peach tea");
    assert_eq!(bill["totals"]["grandTotal"], 90_000);

    let (status, bytes) = send_raw(
        &app,
        Method::GET,
        &format!("/api/orders/{}/bill/text", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("Test Café"));
    assert!(text.contains("Latte"));
    assert!(text.contains("Table: Table 1"));
}

#[tokio::test]
async fn test_not_found_and_validation_errors() {
    let app = setup().await;

    let (status, err) = send(&app, Method::GET, "/api/orders/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({ "channel": "dine_in", "items": [{ "productId": "ghost", "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, err) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({ "channel": "dine_in", "items": [{ "productId": "latte", "quantity": 0 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({ "channel": "dine_in", "items": [{ "productId": "old", "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A price that would overflow the line total is refused up front
    let (status, err) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({ "channel": "dine_in", "items": [{ "productId": "gold", "quantity": 3 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION_ERROR");

    let id = create_reference_order(&app).await;
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{}/promotion", id),
        Some(json!({ "promotionId": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, err) = send(
        &app,
        Method::GET,
        "/api/reports/summary?from=2026-03-10&to=2026-03-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_numbers() {
    let app = setup().await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    Method::POST,
                    "/api/orders",
                    Some(json!({ "channel": "takeaway", "items": [{ "productId": "latte", "quantity": 1 }] })),
                )
                .await
            })
        })
        .collect();

    let mut numbers = HashSet::new();
    for handle in handles {
        let (status, order) = handle.await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        numbers.insert(order["orderNumber"].as_str().unwrap().to_string());
    }
    assert_eq!(numbers.len(), 8);

    let prefix = Utc::now().format("%Y%m%d").to_string();
    assert!(numbers.iter().all(|n| n.starts_with(&prefix)));
}

#[tokio::test]
async fn test_empty_report_range() {
    let app = setup().await;
    let (status, summary) = send(
        &app,
        Method::GET,
        "/api/reports/summary?from=2020-01-01&to=2020-01-31",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["revenue"], 0);
    assert_eq!(summary["cogs"], 0);
    assert_eq!(summary["payroll"], 0);
    assert!(summary["daily"].as_array().unwrap().is_empty());

    let (_, products) = send(
        &app,
        Method::GET,
        "/api/reports/products?from=2020-01-01&to=2020-01-31",
        None,
    )
    .await;
    assert!(products.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bearer_auth_when_secret_configured() {
    let app = setup_with(Some("test-secret")).await;

    let (status, _) = send_raw(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/reports/summary?from={}&to={}", today(), today());
    let (status, _) = send_raw(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let now = Utc::now();
    let claims = Claims {
        sub: "owner-1".to_string(),
        role: "owner".to_string(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    let good = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap();
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"wrong-secret"),
    )
    .unwrap();

    let (status, _) = send_raw(&app, Method::GET, &uri, None, Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_raw(&app, Method::GET, &uri, None, Some(&good)).await;
    assert_eq!(status, StatusCode::OK);
}
