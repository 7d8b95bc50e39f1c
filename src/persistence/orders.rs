//! Order persistence: insert with items and reservations, update status, load.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::db_qty;
use crate::persistence::catalog::upsert_inventory_tx;
use crate::types::catalog::Inventory;
use crate::types::order::{Order, OrderItem, OrderStatus};

#[derive(Debug, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub total_amount: i64,
    pub shipping_address: String,
    pub billing_address: Option<String>,
    pub order_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
}

/// Insert an order, its items and the inventory it reserved in one transaction.
pub async fn insert_order(
    pool: &PgPool,
    order: &Order,
    reserved: &[Inventory],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO orders (id, customer_id, status, total_amount, shipping_address, billing_address, \
         order_date, shipped_date, delivered_date, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(order.id)
    .bind(order.customer_id)
    .bind(order.status.as_str())
    .bind(order.total_amount)
    .bind(&order.shipping_address)
    .bind(&order.billing_address)
    .bind(order.order_date)
    .bind(order.shipped_date)
    .bind(order.delivered_date)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;

    for item in &order.items {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, total_price) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(db_qty(item.quantity)?)
        .bind(item.unit_price)
        .bind(item.total_price)
        .execute(&mut *tx)
        .await?;
    }

    write_inventory(&mut tx, reserved).await?;
    tx.commit().await
}

/// Update order status and dates, and settle inventory in the same transaction.
pub async fn update_order_status(
    pool: &PgPool,
    order: &Order,
    settled: &[Inventory],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE orders SET status = $1, shipped_date = $2, delivered_date = $3, updated_at = $4 \
         WHERE id = $5",
    )
    .bind(order.status.as_str())
    .bind(order.shipped_date)
    .bind(order.delivered_date)
    .bind(order.updated_at)
    .bind(order.id)
    .execute(&mut *tx)
    .await?;
    write_inventory(&mut tx, settled).await?;
    tx.commit().await
}

async fn write_inventory(
    tx: &mut Transaction<'_, Postgres>,
    records: &[Inventory],
) -> Result<(), sqlx::Error> {
    for inv in records {
        upsert_inventory_tx(tx, inv).await?;
    }
    Ok(())
}

pub async fn list_orders(pool: &PgPool) -> Result<Vec<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(
        "SELECT id, customer_id, status, total_amount, shipping_address, billing_address, \
         order_date, shipped_date, delivered_date, created_at, updated_at FROM orders",
    )
    .fetch_all(pool)
    .await
}

pub async fn list_order_items(pool: &PgPool) -> Result<Vec<OrderItemRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, product_id, quantity, unit_price, total_price FROM order_items",
    )
    .fetch_all(pool)
    .await
}

/// Convert an OrderRow to an Order. Skips rows with an unknown status.
pub fn order_row_to_order(row: OrderRow, items: Vec<OrderItem>) -> Option<Order> {
    let status = OrderStatus::from_code(&row.status)?;
    Some(Order {
        id: row.id,
        customer_id: row.customer_id,
        status,
        total_amount: row.total_amount,
        shipping_address: row.shipping_address,
        billing_address: row.billing_address,
        order_date: row.order_date,
        shipped_date: row.shipped_date,
        delivered_date: row.delivered_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
        items,
    })
}

/// Skips items with a non-positive quantity.
pub fn item_row_to_item(row: &OrderItemRow) -> Option<OrderItem> {
    let quantity = u32::try_from(row.quantity).ok().filter(|&q| q > 0)?;
    Some(OrderItem {
        id: row.id,
        order_id: row.order_id,
        product_id: row.product_id,
        quantity,
        unit_price: row.unit_price,
        total_price: row.total_price,
    })
}
