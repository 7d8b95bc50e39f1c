//! Shared fixtures: an in-memory app on a random port plus seeding helpers.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use hapas_store::api::auth::{Claims, PrincipalKind, create_token, hash_password};
use hapas_store::api::routes::{AppState, app_router};
use hapas_store::config::Config;
use hapas_store::store::Store;
use hapas_store::types::account::{Admin, AdminRole, Customer};
use hapas_store::types::catalog::{Category, Inventory, Product};
use hapas_store::types::order::{Amount, Qty};
use uuid::Uuid;

pub const SECRET: &[u8] = b"test-jwt-secret";

pub struct TestApp {
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
    _handle: tokio::task::JoinHandle<()>,
}

pub fn test_app_state(config: Config) -> AppState {
    AppState {
        store: Store::default().shared(),
        db: None,
        config: Arc::new(config),
    }
}

/// Spawn app on a random port and keep the server task alive with the returned value.
pub async fn spawn_app(state: AppState) -> TestApp {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app_router(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestApp {
        base_url: format!("http://{}", addr),
        state,
        client: reqwest::Client::new(),
        _handle: handle,
    }
}

pub async fn spawn_default() -> TestApp {
    spawn_app(test_app_state(Config::with_secret(SECRET))).await
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Admin with a real password hash, for login tests.
    pub async fn seed_admin(&self, email: &str, password: &str, role: AdminRole) -> Admin {
        let admin = Admin {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            full_name: "Quản Trị".to_string(),
            role,
            created_at: Utc::now(),
        };
        self.state
            .store
            .write()
            .await
            .admins
            .insert(admin.id, admin.clone());
        admin
    }

    pub async fn seed_customer(&self, email: &str, password: &str) -> Customer {
        let customer = Customer {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            full_name: "Nguyễn Thị Lan".to_string(),
            phone: Some("0901234567".to_string()),
            address: Some("12 Lý Thường Kiệt, Hà Nội".to_string()),
            created_at: Utc::now(),
        };
        self.state
            .store
            .write()
            .await
            .customers
            .insert(customer.id, customer.clone());
        customer
    }

    /// Token for a fresh admin of `role`, minted without going through login.
    pub async fn admin_token(&self, role: AdminRole) -> String {
        let email = format!("{}@hapas.vn", Uuid::new_v4().simple());
        let admin = Admin {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: String::new(),
            full_name: "Quản Trị".to_string(),
            role,
            created_at: Utc::now(),
        };
        self.state
            .store
            .write()
            .await
            .admins
            .insert(admin.id, admin.clone());
        let claims = Claims::new(admin.id, &email, PrincipalKind::Admin, Some(role), 1);
        create_token(SECRET, &claims).unwrap()
    }

    /// Fresh customer and a token for it.
    pub async fn customer_token(&self) -> (Uuid, String) {
        let email = format!("{}@khach.vn", Uuid::new_v4().simple());
        let customer = Customer {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: String::new(),
            full_name: "Trần Văn Minh".to_string(),
            phone: None,
            address: None,
            created_at: Utc::now(),
        };
        let id = customer.id;
        self.state.store.write().await.customers.insert(id, customer);
        let claims = Claims::new(id, &email, PrincipalKind::Customer, None, 1);
        (id, create_token(SECRET, &claims).unwrap())
    }

    pub async fn seed_category(&self, name: &str) -> Uuid {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let id = category.id;
        self.state.store.write().await.categories.insert(id, category);
        id
    }

    /// Active product with `stock` on hand in a new category.
    pub async fn seed_product(&self, name: &str, price: Amount, stock: Qty) -> Uuid {
        let category_id = self.seed_category(&format!("Danh mục {}", name)).await;
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            category_id,
            name: name.to_string(),
            description: None,
            price,
            brand: Some("Hapas".to_string()),
            material: None,
            color: None,
            size: None,
            image_urls: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let id = product.id;
        let mut store = self.state.store.write().await;
        store.products.insert(id, product);
        store.put_inventory(vec![Inventory::new(id, stock, None)]);
        id
    }

    pub async fn stock_of(&self, product_id: Uuid) -> (Qty, Qty) {
        let store = self.state.store.read().await;
        let inv = &store.inventory[&product_id];
        (inv.quantity, inv.reserved_quantity)
    }
}
