use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::api::{accounts, catalog, orders, reviews};
use crate::config::Config;
use crate::persistence::{self, PgPool};
use crate::store::SharedStore;

/// Shared application state: in-memory tables, optional database, configuration.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    /// When set, every mutation is written here before memory is updated.
    pub db: Option<PgPool>,
    pub config: Arc<Config>,
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match &state.db {
        Some(pool) if persistence::ping(pool).await => "connected",
        Some(_) => "disconnected",
        None => "not_configured",
    };
    Json(json!({ "status": "healthy", "database": database }))
}

pub fn app_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(accounts::register))
        .route("/api/auth/login", post(accounts::customer_login))
        .route("/api/categories", get(catalog::public_categories))
        .route("/api/products", get(catalog::public_products))
        .route("/api/products/search", get(catalog::search_products))
        .route("/api/products/{id}", get(catalog::public_product))
        .route(
            "/api/reviews",
            get(reviews::list_reviews).post(reviews::submit_review),
        )
        .route("/api/reviews/customer", get(reviews::my_reviews))
        .route(
            "/api/reviews/{id}",
            get(reviews::my_review)
                .put(reviews::edit_my_review)
                .delete(reviews::delete_my_review),
        )
        .route(
            "/api/reviews/product/{product_id}",
            get(reviews::product_reviews),
        )
        .route(
            "/api/orders",
            get(orders::list_my_orders).post(orders::create_order),
        )
        .route("/api/orders/{id}", get(orders::get_my_order));

    let admin = Router::new()
        .route("/api/admin/login", post(accounts::admin_login))
        .route("/api/admin/customers", get(accounts::admin_list_customers))
        .route("/api/admin/customers/{id}", get(accounts::admin_get_customer))
        .route(
            "/api/admin/categories",
            get(catalog::admin_list_categories).post(catalog::create_category),
        )
        .route(
            "/api/admin/categories/{id}",
            get(catalog::admin_get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route(
            "/api/admin/products",
            get(catalog::admin_list_products).post(catalog::create_product),
        )
        .route(
            "/api/admin/products/{id}",
            get(catalog::admin_get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/api/admin/inventory", get(catalog::admin_list_inventory))
        .route(
            "/api/admin/inventory/{product_id}",
            put(catalog::update_inventory),
        )
        .route("/api/admin/orders", get(orders::admin_list_orders))
        .route("/api/admin/orders/{id}", get(orders::admin_get_order))
        .route(
            "/api/admin/orders/{id}/status",
            put(orders::update_order_status),
        )
        .route(
            "/api/admin/orders/{id}/deliver",
            put(orders::confirm_delivery),
        )
        .route(
            "/api/admin/reviews",
            get(reviews::admin_list_reviews).post(reviews::admin_create_review),
        )
        .route("/api/admin/reviews/stats", get(reviews::admin_review_stats))
        .route(
            "/api/admin/reviews/{id}",
            get(reviews::admin_get_review)
                .put(reviews::moderate_review)
                .delete(reviews::delete_review),
        );

    public
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
