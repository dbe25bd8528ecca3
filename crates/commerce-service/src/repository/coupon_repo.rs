//! 优惠券仓储

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::traits::CouponRepositoryTrait;
use crate::dto::{CouponQuery, PageRequest};
use crate::error::Result;
use crate::models::{Coupon, CouponInput};

const COUPON_COLUMNS: &str = r#"
    c.id, c.code, c.name, c.description, c.discount_type, c.discount_value, c.max_discount,
    c.min_purchase, c.usage_limit, c.per_buyer_limit, c.used_count, c.starts_at, c.expires_at,
    c.is_active, c.created_at, c.updated_at,
    COALESCE(
        ARRAY(SELECT category_id FROM coupon_categories WHERE coupon_id = c.id ORDER BY category_id),
        '{}'
    ) AS category_ids
"#;

/// 与 Coupon::status 相同的派生规则，$2 为当前时间
const STATUS_EXPR: &str = r#"
    CASE
        WHEN $2 >= c.expires_at THEN 'expired'
        WHEN NOT c.is_active THEN 'inactive'
        WHEN $2 < c.starts_at THEN 'scheduled'
        WHEN c.usage_limit IS NOT NULL AND c.used_count >= c.usage_limit THEN 'exhausted'
        ELSE 'active'
    END
"#;

pub struct CouponRepository {
    pool: PgPool,
}

impl CouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn replace_categories(
        tx: &mut Transaction<'_, Postgres>,
        coupon_id: i64,
        category_ids: &[i64],
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM coupon_categories WHERE coupon_id = $1")
            .bind(coupon_id)
            .execute(&mut **tx)
            .await?;

        if !category_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO coupon_categories (coupon_id, category_id)
                SELECT $1, UNNEST($2::BIGINT[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(coupon_id)
            .bind(category_ids)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl CouponRepositoryTrait for CouponRepository {
    async fn list(
        &self,
        query: &CouponQuery,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<(Vec<Coupon>, i64)> {
        let keyword = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| format!("%{}%", k));
        let status = query.status.map(|s| s.as_str());

        let condition = format!(
            r#"
            WHERE ($1::text IS NULL OR c.code ILIKE $1 OR c.name ILIKE $1)
              AND ($3::text IS NULL OR ({STATUS_EXPR}) = $3)
            "#
        );

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM coupons c {condition}"))
                .bind(&keyword)
                .bind(now)
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            "SELECT {COUPON_COLUMNS} FROM coupons c {condition} \
             ORDER BY c.created_at DESC, c.id DESC LIMIT $4 OFFSET $5"
        );
        let coupons = sqlx::query_as::<_, Coupon>(&sql)
            .bind(&keyword)
            .bind(now)
            .bind(status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((coupons, total))
    }

    async fn get(&self, id: i64) -> Result<Option<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons c WHERE c.id = $1");
        let coupon = sqlx::query_as::<_, Coupon>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(coupon)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons c WHERE c.code = $1");
        let coupon = sqlx::query_as::<_, Coupon>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(coupon)
    }

    async fn code_exists(&self, code: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM coupons WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, input: &CouponInput) -> Result<Coupon> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO coupons (code, name, description, discount_type, discount_value,
                                 max_discount, min_purchase, usage_limit, per_buyer_limit,
                                 starts_at, expires_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.discount_type)
        .bind(input.discount_value)
        .bind(input.max_discount)
        .bind(input.min_purchase)
        .bind(input.usage_limit)
        .bind(input.per_buyer_limit)
        .bind(input.starts_at)
        .bind(input.expires_at)
        .bind(input.is_active)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_categories(&mut tx, id, &input.category_ids).await?;

        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons c WHERE c.id = $1");
        let coupon = sqlx::query_as::<_, Coupon>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(coupon)
    }

    async fn update(&self, id: i64, input: &CouponInput) -> Result<Option<Coupon>> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET name = $2, description = $3, discount_type = $4, discount_value = $5,
                max_discount = $6, min_purchase = $7, usage_limit = $8, per_buyer_limit = $9,
                starts_at = $10, expires_at = $11, is_active = $12, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.discount_type)
        .bind(input.discount_value)
        .bind(input.max_discount)
        .bind(input.min_purchase)
        .bind(input.usage_limit)
        .bind(input.per_buyer_limit)
        .bind(input.starts_at)
        .bind(input.expires_at)
        .bind(input.is_active)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        Self::replace_categories(&mut tx, id, &input.category_ids).await?;

        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons c WHERE c.id = $1");
        let coupon = sqlx::query_as::<_, Coupon>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(coupon))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn buyer_usage_count(&self, coupon_id: i64, buyer_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM coupon_usages WHERE coupon_id = $1 AND buyer_id = $2",
        )
        .bind(coupon_id)
        .bind(buyer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_orders(&self, coupon_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE coupon_id = $1")
            .bind(coupon_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>, batch_size: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET is_active = false, updated_at = NOW()
            WHERE id IN (
                SELECT id FROM coupons
                WHERE is_active = true AND expires_at <= $1
                ORDER BY expires_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            "#,
        )
        .bind(now)
        .bind(batch_size)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
