//! 品牌 / 成色 / 包装状况仓储
//!
//! 三张表结构一致，表名与外键列来自 MasterDataKind 的固定映射

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::MasterDataRepositoryTrait;
use crate::error::Result;
use crate::models::{MasterData, MasterDataInput, MasterDataKind};

const MASTER_DATA_COLUMNS: &str =
    "id, name, slug, description, urutan, is_active, created_at, updated_at";

pub struct MasterDataRepository {
    pool: PgPool,
}

impl MasterDataRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MasterDataRepositoryTrait for MasterDataRepository {
    async fn list(&self, kind: MasterDataKind, active_only: bool) -> Result<Vec<MasterData>> {
        let sql = format!(
            "SELECT {MASTER_DATA_COLUMNS} FROM {} \
             WHERE ($1 = false OR is_active = true) \
             ORDER BY urutan ASC, id ASC",
            kind.table()
        );
        let rows = sqlx::query_as::<_, MasterData>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, kind: MasterDataKind, id: i64) -> Result<Option<MasterData>> {
        let sql = format!(
            "SELECT {MASTER_DATA_COLUMNS} FROM {} WHERE id = $1",
            kind.table()
        );
        let row = sqlx::query_as::<_, MasterData>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn slug_exists(
        &self,
        kind: MasterDataKind,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
            kind.table()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(slug)
            .bind(exclude_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create(&self, kind: MasterDataKind, input: &MasterDataInput) -> Result<MasterData> {
        let table = kind.table();
        let sql = format!(
            r#"
            INSERT INTO {table} (name, slug, description, is_active, urutan)
            VALUES ($1, $2, $3, $4, (SELECT COALESCE(MAX(urutan), 0) + 1 FROM {table}))
            RETURNING {MASTER_DATA_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, MasterData>(&sql)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(
        &self,
        kind: MasterDataKind,
        id: i64,
        input: &MasterDataInput,
    ) -> Result<Option<MasterData>> {
        let sql = format!(
            r#"
            UPDATE {}
            SET name = $2, slug = $3, description = $4, is_active = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {MASTER_DATA_COLUMNS}
            "#,
            kind.table()
        );
        let row = sqlx::query_as::<_, MasterData>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, kind: MasterDataKind, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn count_products(&self, kind: MasterDataKind, id: i64) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM products WHERE {} = $1",
            kind.product_column()
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
