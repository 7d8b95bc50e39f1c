//! Review submission rules, moderation and rating statistics.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::store::Store;
use crate::types::order::OrderStatus;
use crate::types::review::{Review, ReviewStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("Rating must be between 1 and 5")]
    InvalidRating,
    #[error("Product not found")]
    ProductNotFound,
    #[error("Customer not found")]
    CustomerNotFound,
    #[error("You have already reviewed this product.")]
    AlreadyReviewed,
    #[error("Review not found")]
    NotFound,
    #[error("Review not found or does not belong to you")]
    NotOwned,
    #[error("Invalid status. Must be pending, approved, or rejected")]
    InvalidStatus,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub rating: i64,
    pub comment: Option<String>,
    pub is_verified_purchase: bool,
}

/// Ordering of a product's review list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    HighestRating,
    LowestRating,
}

impl ReviewSort {
    /// Unknown values fall back to newest first.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("oldest") => ReviewSort::Oldest,
            Some("highestRating") => ReviewSort::HighestRating,
            Some("lowestRating") => ReviewSort::LowestRating,
            _ => ReviewSort::Newest,
        }
    }

    pub fn apply(self, reviews: &mut [&Review]) {
        match self {
            ReviewSort::Newest => reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ReviewSort::Oldest => reviews.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            ReviewSort::HighestRating => reviews.sort_by(|a, b| {
                b.rating.cmp(&a.rating).then(b.created_at.cmp(&a.created_at))
            }),
            ReviewSort::LowestRating => reviews.sort_by(|a, b| {
                a.rating.cmp(&b.rating).then(b.created_at.cmp(&a.created_at))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
    #[serde(rename = "totalReviews")]
    pub total_reviews: usize,
    /// Count per rating, index 0 is one star.
    #[serde(rename = "ratingDistribution")]
    pub rating_distribution: [usize; 5],
}

/// A customer's purchase counts once the goods reached them.
pub fn has_purchased(store: &Store, customer_id: Uuid, product_id: Uuid) -> bool {
    store.orders.values().any(|o| {
        o.customer_id == customer_id
            && matches!(o.status, OrderStatus::Delivered | OrderStatus::Completed)
            && o.contains_product(product_id)
    })
}

/// Customer submission: one review per (customer, product).
pub fn plan_submission(
    store: &Store,
    new_review: NewReview,
    auto_approve: bool,
) -> Result<Review, ReviewError> {
    let rating = checked_rating(new_review.rating)?;
    if !store.products.contains_key(&new_review.product_id) {
        return Err(ReviewError::ProductNotFound);
    }
    let duplicate = store.reviews.values().any(|r| {
        r.customer_id == new_review.customer_id && r.product_id == new_review.product_id
    });
    if duplicate {
        return Err(ReviewError::AlreadyReviewed);
    }

    let verified = new_review.is_verified_purchase
        || has_purchased(store, new_review.customer_id, new_review.product_id);
    let status = if auto_approve {
        ReviewStatus::Approved
    } else {
        ReviewStatus::Pending
    };
    Ok(build(new_review, rating, verified, status))
}

/// Admin-entered review; always starts pending and is not deduplicated.
pub fn plan_admin_entry(store: &Store, new_review: NewReview) -> Result<Review, ReviewError> {
    let rating = checked_rating(new_review.rating)?;
    if !store.customers.contains_key(&new_review.customer_id) {
        return Err(ReviewError::CustomerNotFound);
    }
    if !store.products.contains_key(&new_review.product_id) {
        return Err(ReviewError::ProductNotFound);
    }
    let verified = new_review.is_verified_purchase;
    Ok(build(new_review, rating, verified, ReviewStatus::Pending))
}

/// Approve, reject or reopen a review, optionally replacing its comment.
pub fn plan_moderation(
    store: &Store,
    review_id: Uuid,
    status: &str,
    comment: Option<String>,
) -> Result<Review, ReviewError> {
    let status = ReviewStatus::parse(status).ok_or(ReviewError::InvalidStatus)?;
    let mut review = store
        .reviews
        .get(&review_id)
        .cloned()
        .ok_or(ReviewError::NotFound)?;
    review.status = status;
    if comment.is_some() {
        review.comment = comment;
    }
    review.updated_at = Utc::now();
    Ok(review)
}

/// A customer's own review; someone else's is reported the same as a missing one.
pub fn owned_review(
    store: &Store,
    customer_id: Uuid,
    review_id: Uuid,
) -> Result<&Review, ReviewError> {
    store
        .reviews
        .get(&review_id)
        .filter(|r| r.customer_id == customer_id)
        .ok_or(ReviewError::NotOwned)
}

/// Customer edit of their own review. Absent fields stay as they are; an
/// empty comment clears it. Moderation status is left alone.
pub fn plan_customer_edit(
    store: &Store,
    customer_id: Uuid,
    review_id: Uuid,
    rating: Option<i64>,
    comment: Option<String>,
) -> Result<Review, ReviewError> {
    let mut review = owned_review(store, customer_id, review_id)?.clone();
    let rating = rating.map(checked_rating).transpose()?;
    if let Some(rating) = rating {
        review.rating = rating;
    }
    if let Some(comment) = comment {
        review.comment = Some(comment).filter(|c| !c.trim().is_empty());
    }
    review.updated_at = Utc::now();
    Ok(review)
}

pub fn moderation_stats<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> ModerationStats {
    let mut stats = ModerationStats {
        total: 0,
        pending: 0,
        approved: 0,
        rejected: 0,
        average_rating: 0.0,
    };
    let mut sum: u64 = 0;
    for r in reviews {
        stats.total += 1;
        sum += u64::from(r.rating);
        match r.status {
            ReviewStatus::Pending => stats.pending += 1,
            ReviewStatus::Approved => stats.approved += 1,
            ReviewStatus::Rejected => stats.rejected += 1,
        }
    }
    stats.average_rating = average(sum, stats.total);
    stats
}

pub fn rating_summary<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> RatingSummary {
    let mut distribution = [0usize; 5];
    let mut sum: u64 = 0;
    let mut total = 0;
    for r in reviews {
        total += 1;
        sum += u64::from(r.rating);
        if (1..=5).contains(&r.rating) {
            distribution[usize::from(r.rating) - 1] += 1;
        }
    }
    RatingSummary {
        average_rating: average(sum, total),
        total_reviews: total,
        rating_distribution: distribution,
    }
}

fn average(sum: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

fn checked_rating(rating: i64) -> Result<u8, ReviewError> {
    match u8::try_from(rating) {
        Ok(r) if (1..=5).contains(&r) => Ok(r),
        _ => Err(ReviewError::InvalidRating),
    }
}

fn build(new_review: NewReview, rating: u8, verified: bool, status: ReviewStatus) -> Review {
    let now = Utc::now();
    Review {
        id: Uuid::new_v4(),
        customer_id: new_review.customer_id,
        product_id: new_review.product_id,
        rating,
        comment: new_review.comment.filter(|c| !c.trim().is_empty()),
        is_verified_purchase: verified,
        status,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8, status: ReviewStatus) -> Review {
        let now = Utc::now();
        Review {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            rating,
            comment: None,
            is_verified_purchase: false,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stats_count_by_status() {
        let reviews = [
            review(5, ReviewStatus::Approved),
            review(4, ReviewStatus::Approved),
            review(1, ReviewStatus::Rejected),
            review(2, ReviewStatus::Pending),
        ];
        let stats = moderation_stats(&reviews);
        assert_eq!(stats.total, 4);
        assert_eq!((stats.pending, stats.approved, stats.rejected), (1, 2, 1));
        assert_eq!(stats.average_rating, 3.0);
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let summary = rating_summary(std::iter::empty());
        assert_eq!(summary.total_reviews, 0);
        assert_eq!(summary.average_rating, 0.0);
        assert_eq!(summary.rating_distribution, [0; 5]);
    }

    #[test]
    fn summary_distribution() {
        let reviews = [
            review(5, ReviewStatus::Approved),
            review(5, ReviewStatus::Approved),
            review(2, ReviewStatus::Approved),
        ];
        let summary = rating_summary(&reviews);
        assert_eq!(summary.rating_distribution, [0, 1, 0, 0, 2]);
        assert_eq!(summary.average_rating, 4.0);
    }

    #[test]
    fn sort_by_rating() {
        let a = review(2, ReviewStatus::Approved);
        let b = review(5, ReviewStatus::Approved);
        let mut list = vec![&a, &b];
        ReviewSort::parse(Some("highestRating")).apply(&mut list);
        assert_eq!(list[0].rating, 5);
        ReviewSort::parse(Some("lowestRating")).apply(&mut list);
        assert_eq!(list[0].rating, 2);
    }

    fn store_with(review: &Review) -> Store {
        let mut store = Store::default();
        store.reviews.insert(review.id, review.clone());
        store
    }

    #[test]
    fn customer_edit_keeps_unset_fields() {
        let mut original = review(3, ReviewStatus::Approved);
        original.comment = Some("Hơi rộng".into());
        let store = store_with(&original);

        let edited =
            plan_customer_edit(&store, original.customer_id, original.id, Some(4), None).unwrap();
        assert_eq!(edited.rating, 4);
        assert_eq!(edited.comment.as_deref(), Some("Hơi rộng"));
        assert_eq!(edited.status, ReviewStatus::Approved);

        let cleared = plan_customer_edit(
            &store,
            original.customer_id,
            original.id,
            None,
            Some(" ".into()),
        )
        .unwrap();
        assert_eq!(cleared.rating, 3);
        assert_eq!(cleared.comment, None);
    }

    #[test]
    fn customer_edit_checks_rating_and_owner() {
        let original = review(3, ReviewStatus::Approved);
        let store = store_with(&original);
        assert_eq!(
            plan_customer_edit(&store, original.customer_id, original.id, Some(0), None),
            Err(ReviewError::InvalidRating)
        );
        assert_eq!(
            plan_customer_edit(&store, Uuid::new_v4(), original.id, Some(5), None),
            Err(ReviewError::NotOwned)
        );
        assert_eq!(
            owned_review(&store, Uuid::new_v4(), original.id),
            Err(ReviewError::NotOwned)
        );
    }

    #[test]
    fn rating_bounds() {
        assert_eq!(checked_rating(0), Err(ReviewError::InvalidRating));
        assert_eq!(checked_rating(6), Err(ReviewError::InvalidRating));
        assert_eq!(checked_rating(-1), Err(ReviewError::InvalidRating));
        assert_eq!(checked_rating(3), Ok(3));
    }
}
