//! Admin and customer persistence. Emails are stored as given and compared
//! case-insensitively in memory.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::types::account::{Admin, AdminRole, Customer};

#[derive(FromRow)]
pub struct AdminRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_admin(pool: &PgPool, admin: &Admin) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO admins (id, email, password_hash, full_name, role, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(admin.id)
    .bind(&admin.email)
    .bind(&admin.password_hash)
    .bind(&admin.full_name)
    .bind(admin.role.as_str())
    .bind(admin.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_customer(pool: &PgPool, customer: &Customer) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO customers (id, email, password_hash, full_name, phone, address, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(customer.id)
    .bind(&customer.email)
    .bind(&customer.password_hash)
    .bind(&customer.full_name)
    .bind(&customer.phone)
    .bind(&customer.address)
    .bind(customer.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Admins with an unknown role are skipped.
pub async fn list_admins(pool: &PgPool) -> Result<Vec<Admin>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AdminRow>(
        "SELECT id, email, password_hash, full_name, role, created_at FROM admins",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| {
            Some(Admin {
                role: AdminRole::parse(&r.role)?,
                id: r.id,
                email: r.email,
                password_hash: r.password_hash,
                full_name: r.full_name,
                created_at: r.created_at,
            })
        })
        .collect())
}

pub async fn list_customers(pool: &PgPool) -> Result<Vec<Customer>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CustomerRow>(
        "SELECT id, email, password_hash, full_name, phone, address, created_at FROM customers",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| Customer {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            full_name: r.full_name,
            phone: r.phone,
            address: r.address,
            created_at: r.created_at,
        })
        .collect())
}
