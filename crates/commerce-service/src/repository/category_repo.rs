//! 分类仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::CategoryRepositoryTrait;
use crate::error::Result;
use crate::models::{Category, CategoryInput};

const CATEGORY_COLUMNS: &str =
    "id, parent_id, name, slug, description, icon_url, urutan, is_active, created_at, updated_at";

pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepositoryTrait for CategoryRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE ($1 = false OR is_active = true) \
             ORDER BY urutan ASC, id ASC"
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn get(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, input: &CategoryInput) -> Result<Category> {
        // 新分类排在末尾
        let sql = format!(
            r#"
            INSERT INTO categories (parent_id, name, slug, description, icon_url, is_active, urutan)
            VALUES ($1, $2, $3, $4, $5, $6,
                    (SELECT COALESCE(MAX(urutan), 0) + 1 FROM categories))
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(input.parent_id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(&input.icon_url)
            .bind(input.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(category)
    }

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>> {
        let sql = format!(
            r#"
            UPDATE categories
            SET parent_id = $2, name = $3, slug = $4, description = $5,
                icon_url = $6, is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(input.parent_id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(&input.icon_url)
            .bind(input.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn count_children(&self, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_products(&self, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_coupons(&self, id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM coupon_categories WHERE category_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
