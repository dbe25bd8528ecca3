//! 商品仓储
//!
//! 商品与阶梯价在同一事务内写入，阶梯价更新采用整体替换

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use super::traits::ProductRepositoryTrait;
use crate::dto::PageRequest;
use crate::error::Result;
use crate::models::{PriceTier, Product, ProductFilter, ProductInput};

const PRODUCT_COLUMNS: &str = "p.id, p.sku, p.name, p.slug, p.description, p.category_id, \
     p.brand_id, p.condition_id, p.package_condition_id, p.warehouse_id, p.base_price, p.unit, \
     p.min_order_qty, p.stock, p.weight_grams, p.images, p.is_active, p.created_at, p.updated_at";

/// 检索条件，分类条件同时匹配其子分类
const SEARCH_CONDITION: &str = r#"
    WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.sku ILIKE $1 OR p.description ILIKE $1)
      AND ($2::BIGINT IS NULL OR p.category_id = $2
           OR p.category_id IN (SELECT id FROM categories WHERE parent_id = $2))
      AND ($3::BIGINT IS NULL OR p.brand_id = $3)
      AND ($4::BIGINT IS NULL OR p.condition_id = $4)
      AND ($5::BIGINT IS NULL OR p.base_price >= $5)
      AND ($6::BIGINT IS NULL OR p.base_price <= $6)
      AND ($7 = false OR p.stock > 0)
      AND ($8 = false OR p.is_active = true)
"#;

pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn replace_tiers(
        tx: &mut Transaction<'_, Postgres>,
        product_id: i64,
        tiers: &[PriceTier],
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM product_price_tiers WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut **tx)
            .await?;

        for tier in tiers {
            sqlx::query(
                r#"
                INSERT INTO product_price_tiers (product_id, min_quantity, unit_price)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(product_id)
            .bind(tier.min_quantity)
            .bind(tier.unit_price)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

fn keyword_pattern(filter: &ProductFilter) -> Option<String> {
    filter
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| format!("%{}%", k))
}

#[async_trait]
impl ProductRepositoryTrait for ProductRepository {
    async fn search(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64)> {
        let keyword = keyword_pattern(filter);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products p {SEARCH_CONDITION}"))
                .bind(&keyword)
                .bind(filter.category_id)
                .bind(filter.brand_id)
                .bind(filter.condition_id)
                .bind(filter.min_price)
                .bind(filter.max_price)
                .bind(filter.in_stock_only)
                .bind(filter.active_only)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p {SEARCH_CONDITION} \
             ORDER BY {} LIMIT $9 OFFSET $10",
            filter.sort.order_by()
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&keyword)
            .bind(filter.category_id)
            .bind(filter.brand_id)
            .bind(filter.condition_id)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(filter.in_stock_only)
            .bind(filter.active_only)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((products, total))
    }

    async fn get(&self, id: i64) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.slug = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1)");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn price_tiers(&self, product_id: i64) -> Result<Vec<PriceTier>> {
        let tiers = sqlx::query_as::<_, PriceTier>(
            r#"
            SELECT min_quantity, unit_price
            FROM product_price_tiers
            WHERE product_id = $1
            ORDER BY min_quantity ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tiers)
    }

    async fn price_tiers_for(&self, product_ids: &[i64]) -> Result<Vec<(i64, PriceTier)>> {
        let rows: Vec<(i64, i32, i64)> = sqlx::query_as(
            r#"
            SELECT product_id, min_quantity, unit_price
            FROM product_price_tiers
            WHERE product_id = ANY($1)
            ORDER BY product_id ASC, min_quantity ASC
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, min_quantity, unit_price)| {
                (
                    product_id,
                    PriceTier {
                        min_quantity,
                        unit_price,
                    },
                )
            })
            .collect())
    }

    async fn sku_exists(&self, sku: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(sku)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(
        &self,
        input: &ProductInput,
        stock: i32,
        tiers: Vec<PriceTier>,
    ) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO products AS p (sku, name, slug, description, category_id, brand_id,
                                       condition_id, package_condition_id, warehouse_id,
                                       base_price, unit, min_order_qty, stock, weight_grams,
                                       images, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(&input.sku)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.category_id)
            .bind(input.brand_id)
            .bind(input.condition_id)
            .bind(input.package_condition_id)
            .bind(input.warehouse_id)
            .bind(input.base_price)
            .bind(&input.unit)
            .bind(input.min_order_qty)
            .bind(stock)
            .bind(input.weight_grams)
            .bind(Json(&input.images))
            .bind(input.is_active)
            .fetch_one(&mut *tx)
            .await?;

        Self::replace_tiers(&mut tx, product.id, &tiers).await?;

        tx.commit().await?;
        Ok(product)
    }

    async fn update(
        &self,
        id: i64,
        input: &ProductInput,
        tiers: Option<Vec<PriceTier>>,
    ) -> Result<Option<Product>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE products AS p
            SET sku = $2, name = $3, slug = $4, description = $5, category_id = $6,
                brand_id = $7, condition_id = $8, package_condition_id = $9,
                warehouse_id = $10, base_price = $11, unit = $12, min_order_qty = $13,
                weight_grams = $14, images = $15, is_active = $16, updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&input.sku)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.category_id)
            .bind(input.brand_id)
            .bind(input.condition_id)
            .bind(input.package_condition_id)
            .bind(input.warehouse_id)
            .bind(input.base_price)
            .bind(&input.unit)
            .bind(input.min_order_qty)
            .bind(input.weight_grams)
            .bind(Json(&input.images))
            .bind(input.is_active)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(product) = product else {
            tx.rollback().await?;
            return Ok(None);
        };

        if let Some(tiers) = tiers {
            Self::replace_tiers(&mut tx, id, &tiers).await?;
        }

        tx.commit().await?;
        Ok(Some(product))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        // 阶梯价随商品级联删除
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn count_order_items(&self, id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn adjust_stock(&self, id: i64, delta: i32) -> Result<Option<i32>> {
        let stock: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock + $2 >= 0
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_pattern_trims_and_wraps() {
        let filter = ProductFilter {
            keyword: Some("  beras ".to_string()),
            ..Default::default()
        };
        assert_eq!(keyword_pattern(&filter).as_deref(), Some("%beras%"));

        let blank = ProductFilter {
            keyword: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(keyword_pattern(&blank).is_none());
    }
}
