//! Category, product and inventory persistence.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::db_qty;
use crate::types::catalog::{Category, Inventory, Product};

#[derive(Debug, FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub brand: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub image_urls: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct InventoryRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

pub async fn upsert_category(pool: &PgPool, c: &Category) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO categories (id, name, description, image_url, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (id) DO UPDATE SET name = $2, description = $3, image_url = $4, \
         is_active = $5, updated_at = $7",
    )
    .bind(c.id)
    .bind(&c.name)
    .bind(&c.description)
    .bind(&c.image_url)
    .bind(c.is_active)
    .bind(c.created_at)
    .bind(c.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_category(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Product and its inventory record are written together.
pub async fn upsert_product(
    pool: &PgPool,
    p: &Product,
    inventory: Option<&Inventory>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO products (id, category_id, name, description, price, brand, material, color, \
         size, image_urls, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         ON CONFLICT (id) DO UPDATE SET category_id = $2, name = $3, description = $4, price = $5, \
         brand = $6, material = $7, color = $8, size = $9, image_urls = $10, is_active = $11, \
         updated_at = $13",
    )
    .bind(p.id)
    .bind(p.category_id)
    .bind(&p.name)
    .bind(&p.description)
    .bind(p.price)
    .bind(&p.brand)
    .bind(&p.material)
    .bind(&p.color)
    .bind(&p.size)
    .bind(&p.image_urls)
    .bind(p.is_active)
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(&mut *tx)
    .await?;
    if let Some(inv) = inventory {
        upsert_inventory_tx(&mut tx, inv).await?;
    }
    tx.commit().await
}

/// Inventory rows go with the product (ON DELETE CASCADE).
pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn upsert_inventory(pool: &PgPool, inv: &Inventory) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    upsert_inventory_tx(&mut tx, inv).await?;
    tx.commit().await
}

pub(crate) async fn upsert_inventory_tx(
    tx: &mut Transaction<'_, Postgres>,
    inv: &Inventory,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO inventory (id, product_id, quantity, reserved_quantity, location, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (product_id) DO UPDATE SET quantity = $3, reserved_quantity = $4, \
         location = $5, updated_at = $6",
    )
    .bind(inv.id)
    .bind(inv.product_id)
    .bind(db_qty(inv.quantity)?)
    .bind(db_qty(inv.reserved_quantity)?)
    .bind(&inv.location)
    .bind(inv.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, description, image_url, is_active, created_at, updated_at FROM categories",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| Category {
            id: r.id,
            name: r.name,
            description: r.description,
            image_url: r.image_url,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
        .collect())
}

pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, category_id, name, description, price, brand, material, color, size, \
         image_urls, is_active, created_at, updated_at FROM products",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| Product {
            id: r.id,
            category_id: r.category_id,
            name: r.name,
            description: r.description,
            price: r.price,
            brand: r.brand,
            material: r.material,
            color: r.color,
            size: r.size,
            image_urls: r.image_urls,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
        .collect())
}

/// Rows with negative counts are skipped.
pub async fn list_inventory(pool: &PgPool) -> Result<Vec<Inventory>, sqlx::Error> {
    let rows = sqlx::query_as::<_, InventoryRow>(
        "SELECT id, product_id, quantity, reserved_quantity, location, updated_at FROM inventory",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| {
            Some(Inventory {
                id: r.id,
                product_id: r.product_id,
                quantity: u32::try_from(r.quantity).ok()?,
                reserved_quantity: u32::try_from(r.reserved_quantity).ok()?,
                location: r.location,
                updated_at: r.updated_at,
            })
        })
        .collect())
}
