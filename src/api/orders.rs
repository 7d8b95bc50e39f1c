//! Order endpoints: customer placement and history, admin review and status updates.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::auth::{AdminPrincipal, CustomerPrincipal};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::pagination::paginate;
use crate::api::routes::AppState;
use crate::error::ApiError;
use crate::orders::{self, NewOrder, NewOrderLine};
use crate::persistence;
use crate::store::Store;
use crate::types::order::{Amount, Order, OrderStatus, Qty};

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price: Amount,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub billing_address: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<String>,
}

/// Order JSON with the status rendered as its Vietnamese label.
pub fn localized(order: &Order) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(order).map_err(|e| ApiError::internal("serialize order", e))?;
    value["status"] = json!(order.status.label());
    Ok(value)
}

/// Order plus customer summary and product details per line.
fn detailed(store: &Store, order: &Order) -> Result<Value, ApiError> {
    let mut value = localized(order)?;
    value["customer"] = match store.customers.get(&order.customer_id) {
        Some(c) => json!({
            "id": c.id,
            "full_name": c.full_name,
            "email": c.email,
            "phone": c.phone,
            "address": c.address,
        }),
        None => Value::Null,
    };
    if let Some(items) = value["items"].as_array_mut() {
        for item in items {
            let product = item["product_id"]
                .as_str()
                .and_then(|id| Uuid::parse_str(id).ok())
                .and_then(|id| store.products.get(&id));
            item["product"] = match product {
                Some(p) => json!({
                    "id": p.id,
                    "name": p.name,
                    "price": p.price,
                    "image_urls": p.image_urls,
                }),
                None => Value::Null,
            };
        }
    }
    Ok(value)
}

pub async fn create_order(
    State(state): State<AppState>,
    customer: CustomerPrincipal,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new_order = NewOrder {
        customer_id: customer.customer_id,
        shipping_address: body.shipping_address,
        billing_address: body.billing_address.filter(|a| !a.trim().is_empty()),
        items: body
            .items
            .into_iter()
            .map(|l| {
                let quantity = Qty::try_from(l.quantity).map_err(|_| {
                    ApiError::Validation("Quantity must be a positive number".into())
                })?;
                Ok(NewOrderLine {
                    product_id: l.product_id,
                    quantity,
                    unit_price: l.unit_price,
                })
            })
            .collect::<Result<_, ApiError>>()?,
    };

    let mut store = state.store.write().await;
    if !store.customers.contains_key(&customer.customer_id) {
        return Err(ApiError::Unauthorized("Customer account no longer exists".into()));
    }
    let placement = orders::plan_order(&store, new_order)?;
    if let Some(db) = &state.db {
        persistence::insert_order(db, &placement.order, &placement.inventory).await?;
    }
    let order = store.commit_placement(placement);
    tracing::info!(order_id = %order.id, customer_id = %order.customer_id, total = order.total_amount, "order placed");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order created successfully",
            "order": order,
        })),
    ))
}

pub async fn list_my_orders(
    State(state): State<AppState>,
    customer: CustomerPrincipal,
    ApiQuery(params): ApiQuery<OrderListParams>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let mine: Vec<Order> = store
        .orders_of(customer.customer_id)
        .into_iter()
        .cloned()
        .collect();
    let (orders, pagination) = paginate(mine, params.page, params.limit);
    Ok(Json(json!({
        "success": true,
        "orders": orders,
        "pagination": pagination,
    })))
}

/// Orders of other customers are reported as missing.
pub async fn get_my_order(
    State(state): State<AppState>,
    customer: CustomerPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let order = store
        .orders
        .get(&id)
        .filter(|o| o.customer_id == customer.customer_id)
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    Ok(Json(json!({ "success": true, "order": order })))
}

pub async fn admin_list_orders(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiQuery(params): ApiQuery<OrderListParams>,
) -> Result<Json<Value>, ApiError> {
    let filter = params
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty() && *s != "all")
        .map(OrderStatus::parse)
        .transpose()?;

    let store = state.store.read().await;
    let mut all: Vec<&Order> = store
        .orders
        .values()
        .filter(|o| filter.is_none_or(|s| o.status == s))
        .collect();
    all.sort_by(|a, b| b.order_date.cmp(&a.order_date));
    let (page, pagination) = paginate(all, params.page, params.limit);

    let mut rendered = Vec::with_capacity(page.len());
    for order in page {
        let mut value = localized(order)?;
        value["customer"] = match store.customers.get(&order.customer_id) {
            Some(c) => json!({ "id": c.id, "full_name": c.full_name, "email": c.email }),
            None => Value::Null,
        };
        rendered.push(value);
    }
    Ok(Json(json!({
        "success": true,
        "orders": rendered,
        "pagination": pagination,
    })))
}

pub async fn admin_get_order(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let order = store
        .orders
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    Ok(Json(json!({ "success": true, "order": detailed(&store, order)? })))
}

/// The one status-update endpoint; every change goes through the transition table.
pub async fn update_order_status(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut store = state.store.write().await;
    let update = orders::plan_status_update(&store, id, &body.status)?;
    if let Some(db) = &state.db {
        persistence::update_order_status(db, &update.order, &update.inventory).await?;
    }
    let previous = update.previous;
    let order = store.commit_status_update(update);
    tracing::info!(
        order_id = %order.id,
        admin_id = %admin.admin_id,
        from = %previous,
        to = %order.status,
        "order status updated"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Order status updated successfully",
        "order": localized(&order)?,
    })))
}

pub async fn confirm_delivery(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut store = state.store.write().await;
    let update = orders::plan_delivery(&store, id)?;
    if let Some(db) = &state.db {
        persistence::update_order_status(db, &update.order, &update.inventory).await?;
    }
    let order = store.commit_status_update(update);
    tracing::info!(order_id = %order.id, admin_id = %admin.admin_id, "delivery confirmed");

    Ok(Json(json!({
        "success": true,
        "message": "Order delivery confirmed successfully",
        "order": localized(&order)?,
    })))
}
