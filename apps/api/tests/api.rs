//! HTTP tests: the full router against an in-memory database.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use defter_api::{build_app, ApiConfig, AppState};
use defter_db::{Database, DbConfig};

async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    build_app(AppState::new(db, ApiConfig::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, value) = send(app, Method::POST, uri, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{value}");
    value
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn product_crud_and_errors() {
    let app = app().await;

    let product = create(
        &app,
        "/api/products",
        json!({"name": "Demlik Çay", "sku": "TEA-001", "barcode": "8690000000011", "priceCents": 12_990, "quantity": 3}),
    )
    .await;
    let id = product["id"].as_str().unwrap().to_string();
    assert_eq!(product["minQuantity"], 5);

    // Duplicate SKU
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"name": "Other", "sku": "TEA-001", "priceCents": 100})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // Field-level validation
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"name": "", "priceCents": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"priceCents"));

    // Malformed JSON
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/products")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/api/products?search=demlik", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/api/products/barcode/TEA-001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (_, body) = send(&app, Method::GET, "/api/products/low-stock", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/products/{id}"),
        Some(json!({"priceCents": 13_500})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["priceCents"], 13_500);
    assert_eq!(body["name"], "Demlik Çay");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn supplier_delete_removes_its_products() {
    let app = app().await;

    let supplier = create(&app, "/api/suppliers", json!({"name": "Anadolu Gıda"})).await;
    let supplier_id = supplier["id"].as_str().unwrap().to_string();
    assert_eq!(supplier["supplierCode"], "SUP-001");

    let product = create(
        &app,
        "/api/products",
        json!({"name": "Un", "priceCents": 5_000, "supplierId": supplier_id}),
    )
    .await;
    assert_eq!(product["sku"], "SUP-001-001");

    let (_, products) = send(&app, Method::GET, &format!("/api/suppliers/{supplier_id}/products"), None).await;
    assert_eq!(products.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/suppliers/{supplier_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, products) =
        send(&app, Method::GET, &format!("/api/suppliers/{supplier_id}/products"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products, json!([]));

    let (_, all) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn credit_sale_and_payments() {
    let app = app().await;

    let product = create(
        &app,
        "/api/products",
        json!({"name": "Kırtasiye Seti", "priceCents": 5_000, "quantity": 10}),
    )
    .await;
    let customer = create(&app, "/api/customers", json!({"name": "Kaya İnşaat"})).await;
    let product_id = product["id"].as_str().unwrap().to_string();
    let customer_id = customer["id"].as_str().unwrap().to_string();

    // Credit sale of 100.00
    let sale = create(
        &app,
        "/api/transactions",
        json!({
            "transaction": {"customerId": customer_id, "paymentType": "credit"},
            "items": [{"productId": product_id, "quantity": 2}]
        }),
    )
    .await;
    let sale_id = sale["id"].as_str().unwrap().to_string();
    assert_eq!(sale["totalCents"], 10_000);
    assert_eq!(sale["status"], "pending");
    assert_eq!(sale["customerName"], "Kaya İnşaat");
    assert_eq!(sale["items"].as_array().unwrap().len(), 1);

    let (_, debt) = send(&app, Method::GET, &format!("/api/customers/{customer_id}/debt"), None).await;
    assert_eq!(debt["debtCents"], 10_000);
    assert_eq!(debt["isOverLimit"], false);

    let (_, product) = send(&app, Method::GET, &format!("/api/products/{product_id}"), None).await;
    assert_eq!(product["quantity"], 8);

    // Pay 40.00
    let (status, receipt) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({"amountCents": 4_000, "transactionId": sale_id, "customerId": customer_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(receipt["remainingAmountCents"], 6_000);
    assert_eq!(receipt["status"], "pending");
    assert_eq!(receipt["collection"]["totalCents"], -4_000);
    assert_eq!(receipt["collection"]["transactionType"], "debt_collection");

    // Overpay
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({"amountCents": 7_000, "transactionId": sale_id, "customerId": customer_id})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BUSINESS_RULE");

    // Pay the rest
    let (_, receipt) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({"amountCents": 6_000, "transactionId": sale_id, "customerId": customer_id})),
    )
    .await;
    assert_eq!(receipt["remainingAmountCents"], 0);
    assert_eq!(receipt["status"], "completed");

    let (_, customer) = send(&app, Method::GET, &format!("/api/customers/{customer_id}"), None).await;
    assert_eq!(customer["totalDebtCents"], 0);

    let (_, list) = send(&app, Method::GET, "/api/transactions?limit=10", None).await;
    assert_eq!(list.as_array().unwrap().len(), 3);

    let (_, metrics) = send(&app, Method::GET, "/api/dashboard/metrics", None).await;
    assert_eq!(metrics["totalOrders"], 1);
    assert_eq!(metrics["totalSalesCents"], 0);
    assert_eq!(metrics["activeCustomers"], 1);
}

#[tokio::test]
async fn invoice_with_unknown_product_changes_nothing() {
    let app = app().await;

    let product = create(
        &app,
        "/api/products",
        json!({"name": "Çay", "priceCents": 1_000, "quantity": 10}),
    )
    .await;
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/transactions",
        Some(json!({
            "transaction": {"customerName": "Walk-in"},
            "items": [
                {"productId": product_id, "quantity": 1},
                {"productId": "no-such-product", "quantity": 1}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, product) = send(&app, Method::GET, &format!("/api/products/{product_id}"), None).await;
    assert_eq!(product["quantity"], 10);

    let (_, list) = send(&app, Method::GET, "/api/transactions", None).await;
    assert_eq!(list, json!([]));

    // No items at all
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/transactions",
        Some(json!({"transaction": {"customerName": "Walk-in"}, "items": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "items");
}

#[tokio::test]
async fn direct_customer_payment_clamps_at_zero() {
    let app = app().await;
    let customer = create(&app, "/api/customers", json!({"name": "Ayşe"})).await;
    let customer_id = customer["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/customers/{customer_id}/payment"),
        Some(json!({"amountCents": 500, "currency": "USD"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["newDebtCents"], 0);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/customers/missing/payment",
        Some(json!({"amountCents": 500})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn documented_bodies_with_decimal_amounts() {
    let app = app().await;

    let product = create(
        &app,
        "/api/products",
        json!({"name": "Defter A4", "priceCents": 5_000, "quantity": 10}),
    )
    .await;
    let customer = create(&app, "/api/customers", json!({"name": "Yıldız Market"})).await;
    let product_id = product["id"].as_str().unwrap().to_string();
    let customer_id = customer["id"].as_str().unwrap().to_string();

    // Client price wins over the list price
    let sale = create(
        &app,
        "/api/transactions",
        json!({
            "transaction": {"customerId": customer_id, "paymentType": "credit"},
            "items": [{"productId": product_id, "quantity": 1, "price": 100}]
        }),
    )
    .await;
    let sale_id = sale["id"].as_str().unwrap().to_string();
    assert_eq!(sale["items"][0]["priceCents"], 10_000);
    assert_eq!(sale["totalCents"], 10_000);

    let (status, receipt) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(json!({"amount": 40, "transactionId": sale_id, "customerId": customer_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{receipt}");
    assert_eq!(receipt["amountCents"], 4_000);
    assert_eq!(receipt["remainingAmountCents"], 6_000);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/customers/{customer_id}/payment"),
        Some(json!({"amount": 10.5, "currency": "TRY"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["newDebtCents"], 6_000 - 1_050);

    // Misspelled field: rejected instead of charging the list price
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/transactions",
        Some(json!({
            "transaction": {"customerId": customer_id},
            "items": [{"productId": product_id, "quantity": 1, "unitPrice": 100}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, product) = send(&app, Method::GET, &format!("/api/products/{product_id}"), None).await;
    assert_eq!(product["quantity"], 9);
}

#[tokio::test]
async fn oversized_amounts_are_rejected_not_panicking() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"name": "Altın", "priceCents": 5_000_000_000_000_000_000i64})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "priceCents");

    let product = create(
        &app,
        "/api/products",
        json!({"name": "Altın", "priceCents": 1_000, "quantity": 5}),
    )
    .await;
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/transactions",
        Some(json!({
            "transaction": {"customerName": "Walk-in"},
            "items": [
                {"productId": product_id, "quantity": 1, "priceCents": 5_000_000_000_000_000_000i64},
                {"productId": product_id, "quantity": 1, "priceCents": 5_000_000_000_000_000_000i64}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "items[0].priceCents");

    let (_, list) = send(&app, Method::GET, "/api/transactions", None).await;
    assert_eq!(list, json!([]));
}
