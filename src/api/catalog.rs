//! Categories, products and inventory: public storefront reads and admin management.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::auth::AdminPrincipal;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::pagination::paginate;
use crate::api::routes::AppState;
use crate::error::ApiError;
use crate::inventory;
use crate::persistence;
use crate::store::Store;
use crate::types::catalog::{Category, Inventory, Product};
use crate::types::order::{Amount, Qty};

#[derive(Debug, Deserialize)]
pub struct CategoryFilter {
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub category_id: Option<Uuid>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Amount>,
    pub category_id: Option<Uuid>,
    pub brand: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub is_active: Option<bool>,
    pub initial_stock_quantity: Option<Qty>,
    pub inventory_quantity: Option<Qty>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryRequest {
    pub quantity: Qty,
    pub location: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn stock_view(inv: Option<&Inventory>) -> Value {
    match inv {
        Some(i) => json!({
            "quantity": i.quantity,
            "reserved_quantity": i.reserved_quantity,
            "available": i.available(),
            "location": i.location,
        }),
        None => json!({ "quantity": 0, "reserved_quantity": 0, "available": 0, "location": null }),
    }
}

fn product_view(store: &Store, p: &Product) -> Result<Value, ApiError> {
    let mut v = serde_json::to_value(p).map_err(|e| ApiError::internal("serialize product", e))?;
    v["category"] = match store.categories.get(&p.category_id) {
        Some(c) => json!({ "id": c.id, "name": c.name }),
        None => Value::Null,
    };
    v["inventory"] = stock_view(store.inventory.get(&p.id));
    Ok(v)
}

fn newest_first(products: &mut [&Product]) {
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn render_products(store: &Store, products: Vec<&Product>) -> Result<Vec<Value>, ApiError> {
    products.into_iter().map(|p| product_view(store, p)).collect()
}

// --- Public storefront ---

pub async fn public_categories(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    let mut categories: Vec<&Category> = store.categories.values().filter(|c| c.is_active).collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Json(json!({ "success": true, "categories": categories }))
}

pub async fn public_products(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ProductListParams>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let mut products: Vec<&Product> = store
        .products
        .values()
        .filter(|p| p.is_active && params.category_id.is_none_or(|c| p.category_id == c))
        .collect();
    newest_first(&mut products);
    let (page, pagination) = paginate(products, params.page, params.limit);
    Ok(Json(json!({
        "success": true,
        "products": render_products(&store, page)?,
        "pagination": pagination,
    })))
}

/// Case-insensitive name search; `q` or `category_id` is required.
pub async fn search_products(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ProductListParams>,
) -> Result<Json<Value>, ApiError> {
    let query = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    if query.is_none() && params.category_id.is_none() {
        return Err(ApiError::Validation(
            "Query parameter \"q\" or \"category_id\" is required".into(),
        ));
    }
    let needle = query.map(str::to_lowercase);

    let store = state.store.read().await;
    let mut products: Vec<&Product> = store
        .products
        .values()
        .filter(|p| p.is_active)
        .filter(|p| params.category_id.is_none_or(|c| p.category_id == c))
        .filter(|p| {
            needle
                .as_deref()
                .is_none_or(|n| p.name.to_lowercase().contains(n))
        })
        .collect();
    newest_first(&mut products);
    let (page, pagination) = paginate(products, params.page, params.limit);
    Ok(Json(json!({
        "success": true,
        "products": render_products(&store, page)?,
        "pagination": pagination,
    })))
}

pub async fn public_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let product = store
        .products
        .get(&id)
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    Ok(Json(json!({ "success": true, "product": product_view(&store, product)? })))
}

// --- Admin: categories ---

pub async fn admin_list_categories(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiQuery(filter): ApiQuery<CategoryFilter>,
) -> Json<Value> {
    let store = state.store.read().await;
    let mut categories: Vec<Value> = store
        .categories
        .values()
        .filter(|c| filter.is_active.is_none_or(|a| c.is_active == a))
        .map(|c| {
            let mut v = json!(c);
            v["product_count"] = json!(store.products_in_category(c.id));
            v
        })
        .collect();
    categories.sort_by(|a, b| b["created_at"].as_str().cmp(&a["created_at"].as_str()));
    Json(json!({ "success": true, "categories": categories }))
}

pub async fn admin_get_category(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let category = store
        .categories
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;
    Ok(Json(json!({ "success": true, "category": category })))
}

pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Tên danh mục là bắt buộc".into()));
    }
    let mut store = state.store.write().await;
    if store.category_by_name(&name).is_some() {
        return Err(ApiError::Conflict("Danh mục với tên này đã tồn tại".into()));
    }
    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4(),
        name,
        description: non_blank(body.description),
        image_url: non_blank(body.image_url),
        is_active: body.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    if let Some(db) = &state.db {
        persistence::upsert_category(db, &category).await?;
    }
    store.categories.insert(category.id, category.clone());
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Tạo danh mục thành công",
            "category": category,
        })),
    ))
}

pub async fn update_category(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> Result<Json<Value>, ApiError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Tên danh mục là bắt buộc".into()));
    }
    let mut store = state.store.write().await;
    let mut category = store
        .categories
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;
    if store.category_by_name(&name).is_some_and(|c| c.id != id) {
        return Err(ApiError::Conflict("Danh mục với tên này đã tồn tại".into()));
    }
    category.name = name;
    category.description = non_blank(body.description);
    category.image_url = non_blank(body.image_url);
    if let Some(active) = body.is_active {
        category.is_active = active;
    }
    category.updated_at = Utc::now();
    if let Some(db) = &state.db {
        persistence::upsert_category(db, &category).await?;
    }
    store.categories.insert(id, category.clone());
    Ok(Json(json!({ "success": true, "category": category })))
}

/// Refused while products still point at the category.
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut store = state.store.write().await;
    if !store.categories.contains_key(&id) {
        return Err(ApiError::NotFound("Category not found".into()));
    }
    let in_use = store.products_in_category(id);
    if in_use > 0 {
        return Err(ApiError::Validation(format!(
            "Cannot delete category with {in_use} products"
        )));
    }
    if let Some(db) = &state.db {
        persistence::delete_category(db, id).await?;
    }
    store.categories.remove(&id);
    Ok(Json(json!({ "success": true, "message": "Category deleted successfully" })))
}

// --- Admin: products ---

fn validate_product(store: &Store, body: &ProductRequest) -> Result<(String, Amount, Uuid), ApiError> {
    let name = body.name.trim();
    let (Some(price), Some(category_id)) = (body.price, body.category_id) else {
        return Err(ApiError::Validation(
            "Name, price, and category are required".into(),
        ));
    };
    if name.is_empty() {
        return Err(ApiError::Validation(
            "Name, price, and category are required".into(),
        ));
    }
    if price <= 0 {
        return Err(ApiError::Validation(
            "Product price must be a positive number".into(),
        ));
    }
    if !store.categories.contains_key(&category_id) {
        return Err(ApiError::NotFound("Category not found".into()));
    }
    Ok((name.to_string(), price, category_id))
}

pub async fn admin_list_products(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiQuery(params): ApiQuery<ProductListParams>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let mut products: Vec<&Product> = store
        .products
        .values()
        .filter(|p| params.category_id.is_none_or(|c| p.category_id == c))
        .collect();
    newest_first(&mut products);
    let (page, pagination) = paginate(products, params.page, params.limit);
    Ok(Json(json!({
        "success": true,
        "products": render_products(&store, page)?,
        "pagination": pagination,
    })))
}

pub async fn admin_get_product(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let product = store
        .products
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    Ok(Json(json!({ "success": true, "product": product_view(&store, product)? })))
}

pub async fn create_product(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    ApiJson(body): ApiJson<ProductRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    admin.require_catalog_manager()?;
    let mut store = state.store.write().await;
    let (name, price, category_id) = validate_product(&store, &body)?;
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        category_id,
        name,
        description: non_blank(body.description),
        price,
        brand: non_blank(body.brand),
        material: non_blank(body.material),
        color: non_blank(body.color),
        size: non_blank(body.size),
        image_urls: body.image_urls,
        is_active: body.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    let initial = inventory::check_quantity(body.initial_stock_quantity.unwrap_or(0))?;
    let stock = Inventory::new(product.id, initial, None);
    if let Some(db) = &state.db {
        persistence::upsert_product(db, &product, Some(&stock)).await?;
    }
    store.put_inventory(vec![stock]);
    store.products.insert(product.id, product.clone());
    tracing::info!(product_id = %product.id, admin_id = %admin.admin_id, "product created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product created successfully",
            "product": product_view(&store, &product)?,
        })),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ProductRequest>,
) -> Result<Json<Value>, ApiError> {
    admin.require_catalog_manager()?;
    let mut store = state.store.write().await;
    let mut product = store
        .products
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    let (name, price, category_id) = validate_product(&store, &body)?;

    let stock = match body.inventory_quantity {
        Some(quantity) => Some(match store.inventory.get(&id) {
            Some(current) => inventory::set_quantity(current, quantity, None)?,
            None => Inventory::new(id, inventory::check_quantity(quantity)?, None),
        }),
        None => None,
    };

    product.name = name;
    product.price = price;
    product.category_id = category_id;
    product.description = non_blank(body.description);
    product.brand = non_blank(body.brand);
    product.material = non_blank(body.material);
    product.color = non_blank(body.color);
    product.size = non_blank(body.size);
    product.image_urls = body.image_urls;
    if let Some(active) = body.is_active {
        product.is_active = active;
    }
    product.updated_at = Utc::now();

    if let Some(db) = &state.db {
        persistence::upsert_product(db, &product, stock.as_ref()).await?;
    }
    if let Some(stock) = stock {
        store.put_inventory(vec![stock]);
    }
    store.products.insert(id, product.clone());
    Ok(Json(json!({
        "success": true,
        "message": "Product updated successfully",
        "product": product_view(&store, &product)?,
    })))
}

/// Products referenced by any order are deactivated instead of removed.
pub async fn delete_product(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    admin.require_catalog_manager()?;
    let mut store = state.store.write().await;
    let Some(product) = store.products.get(&id).cloned() else {
        return Err(ApiError::NotFound("Product not found".into()));
    };

    if store.orders.values().any(|o| o.contains_product(id)) {
        let mut retired = product;
        retired.is_active = false;
        retired.updated_at = Utc::now();
        if let Some(db) = &state.db {
            persistence::upsert_product(db, &retired, None).await?;
        }
        store.products.insert(id, retired);
        return Ok(Json(json!({
            "success": true,
            "message": "Product has orders and was deactivated",
        })));
    }

    if let Some(db) = &state.db {
        persistence::delete_product(db, id).await?;
    }
    store.products.remove(&id);
    store.inventory.remove(&id);
    store.reviews.retain(|_, r| r.product_id != id);
    Ok(Json(json!({ "success": true, "message": "Product deleted successfully" })))
}

// --- Admin: inventory ---

pub async fn admin_list_inventory(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
) -> Json<Value> {
    let store = state.store.read().await;
    let mut rows: Vec<Value> = store
        .products
        .values()
        .map(|p| {
            let mut v = stock_view(store.inventory.get(&p.id));
            v["product_id"] = json!(p.id);
            v["product_name"] = json!(p.name);
            v["is_active"] = json!(p.is_active);
            v
        })
        .collect();
    rows.sort_by(|a, b| a["product_name"].as_str().cmp(&b["product_name"].as_str()));
    Json(json!({ "success": true, "inventory": rows }))
}

pub async fn update_inventory(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    ApiPath(product_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<InventoryRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut store = state.store.write().await;
    if !store.products.contains_key(&product_id) {
        return Err(ApiError::NotFound("Product not found".into()));
    }
    let location = non_blank(body.location);
    let next = match store.inventory.get(&product_id) {
        Some(current) => inventory::set_quantity(current, body.quantity, location)?,
        None => Inventory::new(product_id, inventory::check_quantity(body.quantity)?, location),
    };
    if let Some(db) = &state.db {
        persistence::upsert_inventory(db, &next).await?;
    }
    tracing::info!(%product_id, quantity = next.quantity, admin_id = %admin.admin_id, "inventory adjusted");
    let view = stock_view(Some(&next));
    store.put_inventory(vec![next]);
    Ok(Json(json!({ "success": true, "inventory": view })))
}
