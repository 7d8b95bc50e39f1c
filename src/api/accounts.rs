//! Customer registration, logins for both principal kinds, admin customer views.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::auth::{
    AdminPrincipal, Claims, PrincipalKind, create_token, hash_password, verify_password,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::pagination::paginate;
use crate::api::routes::AppState;
use crate::config::AdminBootstrap;
use crate::error::ApiError;
use crate::persistence::{self, PgPool};
use crate::store::Store;
use crate::types::account::{Admin, AdminRole, Customer};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomerListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
}

/// Something@domain.tld with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// At least 8 characters with a lower-case letter, an upper-case letter and a digit;
/// only letters, digits and `@$!%*?&`.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@$!%*?&".contains(c))
}

fn registration_errors(req: &RegisterRequest) -> Vec<&'static str> {
    let mut errors = Vec::new();
    if req.full_name.trim().is_empty() {
        errors.push("Họ tên không được để trống");
    }
    if req.email.trim().is_empty() {
        errors.push("Email không được để trống");
    } else if !is_valid_email(req.email.trim()) {
        errors.push("Email không đúng định dạng");
    }
    if req.password.is_empty() {
        errors.push("Mật khẩu không được để trống");
    } else if !is_valid_password(&req.password) {
        errors.push("Mật khẩu phải có 8 ký tự bao gồm chữ hoa, chữ thường và số");
    }
    errors
}

fn customer_summary(c: &Customer) -> Value {
    json!({
        "id": c.id,
        "email": c.email,
        "full_name": c.full_name,
        "phone": c.phone,
        "address": c.address,
    })
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let errors = registration_errors(&body);
    if !errors.is_empty() {
        return Err(ApiError::Validation(format!(
            "Validation failed: {}",
            errors.join("; ")
        )));
    }

    let password_hash = hash_password(&body.password)?;
    let mut store = state.store.write().await;
    let email = body.email.trim().to_string();
    if store.customer_by_email(&email).is_some() {
        return Err(ApiError::Conflict(
            "Customer with this email already exists".into(),
        ));
    }
    let customer = Customer {
        id: Uuid::new_v4(),
        email,
        password_hash,
        full_name: body.full_name.trim().to_string(),
        phone: body.phone.filter(|p| !p.trim().is_empty()),
        address: body.address.filter(|a| !a.trim().is_empty()),
        created_at: Utc::now(),
    };
    if let Some(db) = &state.db {
        persistence::insert_customer(db, &customer).await?;
    }
    let summary = customer_summary(&customer);
    tracing::info!(customer_id = %customer.id, "customer registered");
    store.customers.insert(customer.id, customer);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Customer registered successfully",
            "customer": summary,
        })),
    ))
}

fn require_credentials(body: &LoginRequest) -> Result<(), ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".into(),
        ));
    }
    Ok(())
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".into())
}

pub async fn customer_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    require_credentials(&body)?;
    let store = state.store.read().await;
    let customer = store
        .customer_by_email(body.email.trim())
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&body.password, &customer.password_hash) {
        return Err(invalid_credentials());
    }

    let claims = Claims::new(
        customer.id,
        &customer.email,
        PrincipalKind::Customer,
        None,
        state.config.token_ttl_hours,
    );
    let token = create_token(&state.config.jwt_secret, &claims)
        .map_err(|e| ApiError::internal("sign token", e))?;
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": customer_summary(customer),
    })))
}

pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    require_credentials(&body)?;
    let store = state.store.read().await;
    let admin = store
        .admin_by_email(body.email.trim())
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&body.password, &admin.password_hash) {
        tracing::warn!(email = %admin.email, "admin login with wrong password");
        return Err(invalid_credentials());
    }

    let claims = Claims::new(
        admin.id,
        &admin.email,
        PrincipalKind::Admin,
        Some(admin.role),
        state.config.token_ttl_hours,
    );
    let token = create_token(&state.config.jwt_secret, &claims)
        .map_err(|e| ApiError::internal("sign token", e))?;
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "admin": {
            "id": admin.id,
            "email": admin.email,
            "full_name": admin.full_name,
            "role": admin.role,
        },
    })))
}

pub async fn admin_list_customers(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiQuery(params): ApiQuery<CustomerListParams>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let needle = params.search.as_deref().map(str::to_lowercase);
    let mut customers: Vec<&Customer> = store
        .customers
        .values()
        .filter(|c| {
            needle.as_deref().is_none_or(|n| {
                c.full_name.to_lowercase().contains(n) || c.email.to_lowercase().contains(n)
            })
        })
        .collect();
    customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let (page, pagination) = paginate(customers, params.page, params.limit);

    let rendered: Vec<Value> = page
        .into_iter()
        .map(|c| {
            let mut v = customer_summary(c);
            v["created_at"] = json!(c.created_at);
            v["order_count"] = json!(store.orders_of(c.id).len());
            v
        })
        .collect();
    Ok(Json(json!({
        "success": true,
        "customers": rendered,
        "pagination": pagination,
    })))
}

pub async fn admin_get_customer(
    State(state): State<AppState>,
    _admin: AdminPrincipal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().await;
    let customer = store
        .customers
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Customer not found".into()))?;
    let orders = store
        .orders_of(id)
        .into_iter()
        .map(crate::api::orders::localized)
        .collect::<Result<Vec<_>, _>>()?;
    let mut summary = customer_summary(customer);
    summary["created_at"] = json!(customer.created_at);
    summary["orders"] = Value::Array(orders);
    Ok(Json(json!({ "success": true, "customer": summary })))
}

/// Create the configured super admin unless an admin with that email exists.
pub async fn bootstrap_admin(
    store: &mut Store,
    db: Option<&PgPool>,
    bootstrap: &AdminBootstrap,
) -> Result<bool, ApiError> {
    if store.admin_by_email(&bootstrap.email).is_some() {
        return Ok(false);
    }
    let admin = Admin {
        id: Uuid::new_v4(),
        email: bootstrap.email.clone(),
        password_hash: hash_password(&bootstrap.password)?,
        full_name: "Quản Trị Viên".into(),
        role: AdminRole::SuperAdmin,
        created_at: Utc::now(),
    };
    if let Some(db) = db {
        persistence::insert_admin(db, &admin).await?;
    }
    tracing::info!(email = %admin.email, "bootstrap admin created");
    store.admins.insert(admin.id, admin);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("lan.nguyen@hapas.vn"));
        assert!(!is_valid_email("lan.nguyen@hapas"));
        assert!(!is_valid_email("@hapas.vn"));
        assert!(!is_valid_email("lan nguyen@hapas.vn"));
        assert!(!is_valid_email("a@b@c.vn"));
    }

    #[test]
    fn password_rules() {
        assert!(is_valid_password("Matkhau123"));
        assert!(is_valid_password("Matkhau1!"));
        assert!(!is_valid_password("matkhau123"));
        assert!(!is_valid_password("MATKHAU123"));
        assert!(!is_valid_password("Matkhau"));
        assert!(!is_valid_password("Mk1"));
        assert!(!is_valid_password("Matkhau 123"));
    }

    #[tokio::test]
    async fn bootstrap_creates_super_admin_once() {
        let mut store = Store::default();
        let bootstrap = AdminBootstrap {
            email: "admin@hapas.com".into(),
            password: "Quantri123".into(),
        };
        assert!(bootstrap_admin(&mut store, None, &bootstrap).await.unwrap());
        assert!(!bootstrap_admin(&mut store, None, &bootstrap).await.unwrap());

        let admin = store.admin_by_email("ADMIN@hapas.com").unwrap();
        assert_eq!(admin.role, AdminRole::SuperAdmin);
        assert!(verify_password("Quantri123", &admin.password_hash));
    }
}
