//! Review endpoints: public listings, customer submissions and edits, admin moderation.

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
use crate::persistence;
use crate::reviews::{self, NewReview, ReviewError, ReviewSort};
use crate::store::Store;
use crate::types::review::{Review, ReviewStatus};

#[derive(Debug, Deserialize)]
pub struct ReviewListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub product_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub rating: Option<u8>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductReviewParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub rating: Option<u8>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminReviewParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub product_id: Uuid,
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditReviewRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminReviewRequest {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub rating: i64,
    pub comment: Option<String>,
    #[serde(default)]
    pub is_verified_purchase: bool,
}

#[derive(Debug, Deserialize)]
pub struct ModerationRequest {
    #[serde(default)]
    pub status: String,
    pub comment: Option<String>,
}

/// `None` means no status filter ("all").
fn status_filter(
    raw: Option<&str>,
    default: Option<ReviewStatus>,
) -> Result<Option<ReviewStatus>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some("all") => Ok(None),
        Some(s) => ReviewStatus::parse(s)
            .map(Some)
            .ok_or_else(|| ReviewError::InvalidStatus.into()),
    }
}

/// Review plus the reviewer's name and the product's name.
fn with_names(store: &Store, r: &Review) -> Value {
    let mut v = json!(r);
    v["customer"] = match store.customers.get(&r.customer_id) {
        Some(c) => json!({ "id": c.id, "full_name": c.full_name }),
        None => Value::Null,
    };
    v["product"] = match store.products.get(&r.product_id) {
        Some(p) => json!({ "id": p.id, "name": p.name }),
        None => Value::Null,
    };
    v
}

pub async fn list_reviews(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ReviewListParams>,
) -> Result<Json<Value>, ApiError> {
    let status = status_filter(params.status.as_deref(), Some(ReviewStatus::Approved))?;
    let store = state.store.read().await;
    let mut matching: Vec<&Review> = store
        .reviews
        .values()
        .filter(|r| status.is_none_or(|s| r.status == s))
        .filter(|r| params.product_id.is_none_or(|p| r.product_id == p))
        .filter(|r| params.customer_id.is_none_or(|c| r.customer_id == c))
        .filter(|r| params.rating.is_none_or(|n| r.rating == n))
        .collect();
    ReviewSort::Newest.apply(&mut matching);
    let (page, pagination) = paginate(matching, params.page, params.limit);
    let rendered: Vec<Value> = page.into_iter().map(|r| with_names(&store, r)).collect();
    Ok(Json(json!({
        "success": true,
        "reviews": rendered,
        "pagination": pagination,
    })))
}

/// Approved reviews of one product with rating statistics.
pub async fn product_reviews(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<ProductReviewParams>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let product = store
        .products
        .get(&product_id)
        .ok_or(ReviewError::ProductNotFound)?;

    let approved: Vec<&Review> = store
        .reviews
        .values()
        .filter(|r| r.product_id == product_id && r.status == ReviewStatus::Approved)
        .collect();
    let stats = reviews::rating_summary(approved.iter().copied());

    let mut listed: Vec<&Review> = approved
        .into_iter()
        .filter(|r| params.rating.is_none_or(|n| r.rating == n))
        .collect();
    ReviewSort::parse(params.sort_by.as_deref()).apply(&mut listed);
    let (page, pagination) = paginate(listed, params.page, params.limit);
    let rendered: Vec<Value> = page.into_iter().map(|r| with_names(&store, r)).collect();

    Ok(Json(json!({
        "success": true,
        "product": { "id": product.id, "name": product.name },
        "reviews": rendered,
        "stats": stats,
        "pagination": pagination,
    })))
}

pub async fn submit_review(
    State(state): State<AppState>,
    customer: CustomerPrincipal,
    ApiJson(body): ApiJson<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new_review = NewReview {
        customer_id: customer.customer_id,
        product_id: body.product_id,
        rating: body.rating,
        comment: body.comment,
        is_verified_purchase: false,
    };
    let mut store = state.store.write().await;
    let review = reviews::plan_submission(&store, new_review, state.config.auto_approve_reviews)?;
    if let Some(db) = &state.db {
        persistence::upsert_review(db, &review).await?;
    }
    tracing::info!(
        review_id = %review.id,
        product_id = %review.product_id,
        status = review.status.as_str(),
        "review submitted"
    );
    store.reviews.insert(review.id, review.clone());

    let message = match review.status {
        ReviewStatus::Approved => "Review submitted successfully",
        _ => "Review submitted and awaiting moderation",
    };
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": message, "review": review })),
    ))
}

pub async fn my_reviews(
    State(state): State<AppState>,
    customer: CustomerPrincipal,
) -> Json<Value> {
    let store = state.store.read().await;
    let mut mine: Vec<&Review> = store
        .reviews
        .values()
        .filter(|r| r.customer_id == customer.customer_id)
        .collect();
    ReviewSort::Newest.apply(&mut mine);
    let rendered: Vec<Value> = mine.into_iter().map(|r| with_names(&store, r)).collect();
    Json(json!({ "success": true, "reviews": rendered }))
}

pub async fn my_review(
    State(state): State<AppState>,
    customer: CustomerPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let review = reviews::owned_review(&store, customer.customer_id, id)?;
    Ok(Json(json!({ "success": true, "review": with_names(&store, review) })))
}

pub async fn edit_my_review(
    State(state): State<AppState>,
    customer: CustomerPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<EditReviewRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut store = state.store.write().await;
    let review =
        reviews::plan_customer_edit(&store, customer.customer_id, id, body.rating, body.comment)?;
    if let Some(db) = &state.db {
        persistence::upsert_review(db, &review).await?;
    }
    tracing::info!(review_id = %id, customer_id = %customer.customer_id, "review edited");
    store.reviews.insert(id, review.clone());
    Ok(Json(json!({
        "success": true,
        "message": "Review updated successfully",
        "review": with_names(&store, &review),
    })))
}

pub async fn delete_my_review(
    State(state): State<AppState>,
    customer: CustomerPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut store = state.store.write().await;
    reviews::owned_review(&store, customer.customer_id, id)?;
    if let Some(db) = &state.db {
        persistence::delete_review(db, id).await?;
    }
    store.reviews.remove(&id);
    tracing::info!(review_id = %id, customer_id = %customer.customer_id, "review withdrawn");
    Ok(Json(json!({ "success": true, "message": "Review deleted successfully" })))
}

pub async fn admin_list_reviews(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiQuery(params): ApiQuery<AdminReviewParams>,
) -> Result<Json<Value>, ApiError> {
    let status = status_filter(params.status.as_deref(), None)?;
    let needle = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let store = state.store.read().await;
    let matches_search = |r: &Review| {
        let Some(n) = needle.as_deref() else {
            return true;
        };
        let comment = r.comment.as_deref().unwrap_or_default().to_lowercase();
        let customer = store
            .customers
            .get(&r.customer_id)
            .map(|c| c.full_name.to_lowercase())
            .unwrap_or_default();
        let product = store
            .products
            .get(&r.product_id)
            .map(|p| p.name.to_lowercase())
            .unwrap_or_default();
        comment.contains(n) || customer.contains(n) || product.contains(n)
    };
    let mut matching: Vec<&Review> = store
        .reviews
        .values()
        .filter(|r| status.is_none_or(|s| r.status == s))
        .filter(|r| matches_search(*r))
        .collect();
    ReviewSort::Newest.apply(&mut matching);
    let (page, pagination) = paginate(matching, params.page, params.limit);
    let rendered: Vec<Value> = page.into_iter().map(|r| with_names(&store, r)).collect();
    Ok(Json(json!({
        "success": true,
        "reviews": rendered,
        "pagination": pagination,
    })))
}

pub async fn admin_review_stats(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
) -> Json<Value> {
    let store = state.store.read().await;
    let stats = reviews::moderation_stats(store.reviews.values());
    Json(json!({ "success": true, "stats": stats }))
}

pub async fn admin_get_review(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let review = store.reviews.get(&id).ok_or(ReviewError::NotFound)?;
    Ok(Json(json!({ "success": true, "review": with_names(&store, review) })))
}

/// Reviews entered on a customer's behalf start pending.
pub async fn admin_create_review(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    ApiJson(body): ApiJson<AdminReviewRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new_review = NewReview {
        customer_id: body.customer_id,
        product_id: body.product_id,
        rating: body.rating,
        comment: body.comment,
        is_verified_purchase: body.is_verified_purchase,
    };
    let mut store = state.store.write().await;
    let review = reviews::plan_admin_entry(&store, new_review)?;
    if let Some(db) = &state.db {
        persistence::upsert_review(db, &review).await?;
    }
    tracing::info!(review_id = %review.id, admin_id = %admin.admin_id, "review entered by admin");
    store.reviews.insert(review.id, review.clone());
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Review created successfully",
            "review": review,
        })),
    ))
}

pub async fn moderate_review(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ModerationRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut store = state.store.write().await;
    let review = reviews::plan_moderation(&store, id, body.status.trim(), body.comment)?;
    if let Some(db) = &state.db {
        persistence::upsert_review(db, &review).await?;
    }
    tracing::info!(
        review_id = %id,
        admin_id = %admin.admin_id,
        status = review.status.as_str(),
        "review moderated"
    );
    store.reviews.insert(id, review.clone());
    Ok(Json(json!({
        "success": true,
        "message": "Review updated successfully",
        "review": with_names(&store, &review),
    })))
}

pub async fn delete_review(
    State(state): State<AppState>,
    admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut store = state.store.write().await;
    if !store.reviews.contains_key(&id) {
        return Err(ReviewError::NotFound.into());
    }
    if let Some(db) = &state.db {
        persistence::delete_review(db, id).await?;
    }
    store.reviews.remove(&id);
    tracing::info!(review_id = %id, admin_id = %admin.admin_id, "review deleted");
    Ok(Json(json!({ "success": true, "message": "Review deleted successfully" })))
}
