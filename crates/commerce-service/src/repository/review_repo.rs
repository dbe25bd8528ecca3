//! 评价仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::ReviewRepositoryTrait;
use crate::dto::{PageRequest, ReviewQuery, SubmitReviewRequest};
use crate::error::Result;
use crate::models::{OrderStatus, PublicReview, Review, ReviewStatus};

const REVIEW_COLUMNS: &str = "id, buyer_id, product_id, order_id, rating, comment, status, \
     rejection_reason, moderated_by, moderated_at, created_at, updated_at";

pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepositoryTrait for ReviewRepository {
    async fn purchase_status(
        &self,
        buyer_id: i64,
        order_id: i64,
        product_id: i64,
    ) -> Result<Option<OrderStatus>> {
        let status: Option<OrderStatus> = sqlx::query_scalar(
            r#"
            SELECT o.status
            FROM orders o
            WHERE o.id = $1 AND o.buyer_id = $2
              AND EXISTS (SELECT 1 FROM order_items i WHERE i.order_id = o.id AND i.product_id = $3)
            "#,
        )
        .bind(order_id)
        .bind(buyer_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(status)
    }

    async fn exists(&self, buyer_id: i64, product_id: i64, order_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reviews
                WHERE buyer_id = $1 AND product_id = $2 AND order_id = $3
            )
            "#,
        )
        .bind(buyer_id)
        .bind(product_id)
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, buyer_id: i64, request: &SubmitReviewRequest) -> Result<Review> {
        let sql = format!(
            r#"
            INSERT INTO reviews (buyer_id, product_id, order_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        let comment = request
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(buyer_id)
            .bind(request.product_id)
            .bind(request.order_id)
            .bind(request.rating)
            .bind(comment)
            .fetch_one(&self.pool)
            .await?;
        Ok(review)
    }

    async fn get(&self, id: i64) -> Result<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn list(&self, query: &ReviewQuery, page: PageRequest) -> Result<(Vec<Review>, i64)> {
        let condition = r#"
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::BIGINT IS NULL OR product_id = $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM reviews {condition}"))
            .bind(query.status)
            .bind(query.product_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews {condition} \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(query.status)
            .bind(query.product_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((reviews, total))
    }

    async fn list_by_buyer(
        &self,
        buyer_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<Review>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE buyer_id = $1")
            .bind(buyer_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE buyer_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(buyer_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((reviews, total))
    }

    async fn list_approved(
        &self,
        product_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<PublicReview>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews WHERE product_id = $1 AND status = 'approved'",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        let reviews = sqlx::query_as::<_, PublicReview>(
            r#"
            SELECT r.id, b.name AS buyer_name, r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN buyers b ON b.id = r.buyer_id
            WHERE r.product_id = $1 AND r.status = 'approved'
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(product_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((reviews, total))
    }

    async fn rating_counts(&self, product_id: i64) -> Result<Vec<(i32, i64)>> {
        let counts: Vec<(i32, i64)> = sqlx::query_as(
            r#"
            SELECT rating, COUNT(*)
            FROM reviews
            WHERE product_id = $1 AND status = 'approved'
            GROUP BY rating
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn moderate(
        &self,
        id: i64,
        status: ReviewStatus,
        admin_id: i64,
        reason: Option<String>,
    ) -> Result<Option<Review>> {
        let sql = format!(
            r#"
            UPDATE reviews
            SET status = $2, moderated_by = $3, moderated_at = NOW(),
                rejection_reason = $4, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(status)
            .bind(admin_id)
            .bind(reason)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn delete_pending(&self, buyer_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM reviews WHERE id = $1 AND buyer_id = $2 AND status = 'pending'",
        )
        .bind(id)
        .bind(buyer_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
