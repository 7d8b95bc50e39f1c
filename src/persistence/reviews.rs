//! Review persistence.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::types::review::{Review, ReviewStatus};

#[derive(Debug, FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub is_verified_purchase: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn upsert_review(pool: &PgPool, r: &Review) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO reviews (id, customer_id, product_id, rating, comment, is_verified_purchase, \
         status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (id) DO UPDATE SET comment = $5, status = $7, updated_at = $9",
    )
    .bind(r.id)
    .bind(r.customer_id)
    .bind(r.product_id)
    .bind(i16::from(r.rating))
    .bind(&r.comment)
    .bind(r.is_verified_purchase)
    .bind(r.status.as_str())
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_review(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Rows with an unknown status or out-of-range rating are skipped.
pub async fn list_reviews(pool: &PgPool) -> Result<Vec<Review>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, customer_id, product_id, rating, comment, is_verified_purchase, status, \
         created_at, updated_at FROM reviews",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| {
            let rating = u8::try_from(r.rating).ok().filter(|v| (1..=5).contains(v))?;
            Some(Review {
                id: r.id,
                customer_id: r.customer_id,
                product_id: r.product_id,
                rating,
                comment: r.comment,
                is_verified_purchase: r.is_verified_purchase,
                status: ReviewStatus::parse(&r.status)?,
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
        })
        .collect())
}
