//! Integration tests for order placement, the status lifecycle and stock reservations.

mod common;

use common::{spawn_default, TestApp};
use hapas_store::types::account::AdminRole;
use serde_json::{json, Value};
use uuid::Uuid;

async fn place_order(app: &TestApp, token: &str, product_id: Uuid, quantity: i64) -> reqwest::Response {
    app.client
        .post(app.url("/api/orders"))
        .bearer_auth(token)
        .json(&json!({
            "shipping_address": "45 Nguyễn Huệ, Quận 1, TP.HCM",
            "items": [{ "product_id": product_id, "quantity": quantity, "unit_price": 250000 }],
        }))
        .send()
        .await
        .unwrap()
}

/// A pending order for a fresh customer; returns (order id, product id).
async fn pending_order(app: &TestApp, quantity: i64) -> (String, Uuid) {
    let product_id = app.seed_product("Áo sơ mi lụa", 250000, 10).await;
    let (_, token) = app.customer_token().await;
    let res = place_order(app, &token, product_id, quantity).await;
    assert_eq!(res.status().as_u16(), 201);
    let body: Value = res.json().await.unwrap();
    (body["order"]["id"].as_str().unwrap().to_string(), product_id)
}

async fn set_status(app: &TestApp, token: &str, order_id: &str, status: &str) -> reqwest::Response {
    app.client
        .put(app.url(&format!("/api/admin/orders/{}/status", order_id)))
        .bearer_auth(token)
        .json(&json!({ "status": status }))
        .send()
        .await
        .unwrap()
}

async fn deliver(app: &TestApp, token: &str, order_id: &str) -> reqwest::Response {
    app.client
        .put(app.url(&format!("/api/admin/orders/{}/deliver", order_id)))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn create_order_reserves_stock_and_totals_lines() {
    let app = spawn_default().await;
    let product_id = app.seed_product("Váy hoa", 250000, 10).await;
    let (customer_id, token) = app.customer_token().await;

    let res = place_order(&app, &token, product_id, 2).await;

    assert_eq!(res.status().as_u16(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["order"]["total_amount"], 500000);
    assert_eq!(body["order"]["customer_id"], customer_id.to_string());
    assert_eq!(body["order"]["items"][0]["total_price"], 500000);
    assert_eq!(app.stock_of(product_id).await, (10, 2));
}

#[tokio::test]
async fn insufficient_stock_rejects_order_and_leaves_stock() {
    let app = spawn_default().await;
    let product_id = app.seed_product("Túi da", 250000, 1).await;
    let (_, token) = app.customer_token().await;

    let res = place_order(&app, &token, product_id, 5).await;

    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "insufficient_stock");
    assert_eq!(app.stock_of(product_id).await, (1, 0));
    assert!(app.state.store.read().await.orders.is_empty());
}

#[tokio::test]
async fn order_without_items_returns_400() {
    let app = spawn_default().await;
    let (_, token) = app.customer_token().await;

    let res = app
        .client
        .post(app.url("/api/orders"))
        .bearer_auth(&token)
        .json(&json!({ "shipping_address": "Hà Nội", "items": [] }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
async fn customer_sees_only_own_orders() {
    let app = spawn_default().await;
    let (order_id, _) = pending_order(&app, 1).await;
    let (_, other) = app.customer_token().await;

    let res = app
        .client
        .get(app.url(&format!("/api/orders/{}", order_id)))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);

    let res = app
        .client
        .get(app.url("/api/orders"))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["orders"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn pending_to_processing_succeeds_with_label() {
    let app = spawn_default().await;
    let (order_id, _) = pending_order(&app, 1).await;
    let admin = app.admin_token(AdminRole::Staff).await;

    let res = set_status(&app, &admin, &order_id, "processing").await;

    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Order status updated successfully");
    assert_eq!(body["order"]["status"], "Đang Xử Lý");
}

#[tokio::test]
async fn pending_to_shipped_is_invalid_transition() {
    let app = spawn_default().await;
    let (order_id, _) = pending_order(&app, 1).await;
    let admin = app.admin_token(AdminRole::Staff).await;

    let res = set_status(&app, &admin, &order_id, "shipped").await;

    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "invalid_transition");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("pending"));
    assert!(message.contains("shipped"));
}

#[tokio::test]
async fn label_input_is_accepted() {
    let app = spawn_default().await;
    let (order_id, _) = pending_order(&app, 1).await;
    let admin = app.admin_token(AdminRole::Staff).await;

    let res = set_status(&app, &admin, &order_id, "Đang Xử Lý").await;

    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "Đang Xử Lý");
}

#[tokio::test]
async fn unknown_status_returns_invalid_status() {
    let app = spawn_default().await;
    let (order_id, _) = pending_order(&app, 1).await;
    let admin = app.admin_token(AdminRole::Staff).await;

    let res = set_status(&app, &admin, &order_id, "teleported").await;

    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_status");
}

#[tokio::test]
async fn malformed_status_body_returns_json_envelope() {
    let app = spawn_default().await;
    let (order_id, _) = pending_order(&app, 1).await;
    let admin = app.admin_token(AdminRole::Staff).await;

    let res = app
        .client
        .put(app.url(&format!("/api/admin/orders/{}/status", order_id)))
        .bearer_auth(&admin)
        .json(&json!({ "status": 5 }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn malformed_order_id_returns_json_envelope() {
    let app = spawn_default().await;
    let admin = app.admin_token(AdminRole::Staff).await;

    let res = app
        .client
        .get(app.url("/api/admin/orders/not-a-uuid"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn status_update_on_missing_order_returns_404() {
    let app = spawn_default().await;
    let admin = app.admin_token(AdminRole::Staff).await;

    let res = set_status(&app, &admin, &Uuid::new_v4().to_string(), "processing").await;

    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn status_update_without_token_returns_401() {
    let app = spawn_default().await;
    let (order_id, _) = pending_order(&app, 1).await;

    let res = app
        .client
        .put(app.url(&format!("/api/admin/orders/{}/status", order_id)))
        .json(&json!({ "status": "processing" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 401);
}

#[tokio::test]
async fn deliver_shipped_order_stamps_delivery() {
    let app = spawn_default().await;
    let (order_id, _) = pending_order(&app, 1).await;
    let admin = app.admin_token(AdminRole::Staff).await;
    set_status(&app, &admin, &order_id, "processing").await;
    let res = set_status(&app, &admin, &order_id, "shipped").await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "Đang Giao");
    assert!(!body["order"]["shipped_date"].is_null());

    let res = deliver(&app, &admin, &order_id).await;

    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "Đã Giao");
    assert!(!body["order"]["delivered_date"].is_null());
}

#[tokio::test]
async fn deliver_pending_order_returns_400() {
    let app = spawn_default().await;
    let (order_id, _) = pending_order(&app, 1).await;
    let admin = app.admin_token(AdminRole::Staff).await;

    let res = deliver(&app, &admin, &order_id).await;

    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("'shipped'"));
}

#[tokio::test]
async fn completed_order_can_be_refunded_and_stock_is_consumed_once() {
    let app = spawn_default().await;
    let (order_id, product_id) = pending_order(&app, 3).await;
    let admin = app.admin_token(AdminRole::Manager).await;
    for status in ["processing", "shipped", "delivered", "completed"] {
        let res = set_status(&app, &admin, &order_id, status).await;
        assert_eq!(res.status().as_u16(), 200, "moving to {}", status);
    }
    assert_eq!(app.stock_of(product_id).await, (7, 0));

    let res = set_status(&app, &admin, &order_id, "refunded").await;

    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "Đã Hoàn Tiền");
    assert_eq!(app.stock_of(product_id).await, (7, 0));
}

#[tokio::test]
async fn cancel_releases_reservation_and_is_terminal() {
    let app = spawn_default().await;
    let (order_id, product_id) = pending_order(&app, 4).await;
    let admin = app.admin_token(AdminRole::Staff).await;
    assert_eq!(app.stock_of(product_id).await, (10, 4));

    let res = set_status(&app, &admin, &order_id, "cancelled").await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(app.stock_of(product_id).await, (10, 0));

    let res = set_status(&app, &admin, &order_id, "processing").await;
    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_transition");
}

#[tokio::test]
async fn admin_filters_orders_by_label_or_code() {
    let app = spawn_default().await;
    let (first, _) = pending_order(&app, 1).await;
    pending_order(&app, 1).await;
    let admin = app.admin_token(AdminRole::Staff).await;
    set_status(&app, &admin, &first, "processing").await;

    for filter in ["processing", "Đang Xử Lý"] {
        let res = app
            .client
            .get(app.url("/api/admin/orders"))
            .query(&[("status", filter)])
            .bearer_auth(&admin)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
        let body: Value = res.json().await.unwrap();
        let orders = body["orders"].as_array().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0]["id"], first.as_str());
        assert_eq!(orders[0]["status"], "Đang Xử Lý");
    }
}

#[tokio::test]
async fn admin_order_detail_includes_customer_and_products() {
    let app = spawn_default().await;
    let (order_id, product_id) = pending_order(&app, 2).await;
    let admin = app.admin_token(AdminRole::Staff).await;

    let res = app
        .client
        .get(app.url(&format!("/api/admin/orders/{}", order_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "Chờ Xử Lý");
    assert_eq!(body["order"]["customer"]["full_name"], "Trần Văn Minh");
    assert_eq!(body["order"]["items"][0]["product"]["id"], product_id.to_string());
}

#[tokio::test]
async fn split_lines_beyond_column_range_are_rejected() {
    let app = spawn_default().await;
    let product_id = app.seed_product("Áo khoác", 500000, 10).await;
    let (_, token) = app.customer_token().await;

    let res = app
        .client
        .post(app.url("/api/orders"))
        .bearer_auth(&token)
        .json(&json!({
            "shipping_address": "Hà Nội",
            "items": [
                { "product_id": product_id, "quantity": 2147483648i64, "unit_price": 500000 },
                { "product_id": product_id, "quantity": 2147483648i64, "unit_price": 500000 },
            ],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(app.stock_of(product_id).await, (10, 0));
    assert!(app.state.store.read().await.orders.is_empty());
}
