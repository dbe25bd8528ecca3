//! 仓库仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::WarehouseRepositoryTrait;
use crate::error::Result;
use crate::models::{Warehouse, WarehouseInput};

const WAREHOUSE_COLUMNS: &str =
    "id, name, address, sub_district_id, phone, is_active, created_at, updated_at";

pub struct WarehouseRepository {
    pool: PgPool,
}

impl WarehouseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WarehouseRepositoryTrait for WarehouseRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<Warehouse>> {
        let sql = format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses \
             WHERE ($1 = false OR is_active = true) ORDER BY name ASC"
        );
        let warehouses = sqlx::query_as::<_, Warehouse>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(warehouses)
    }

    async fn get(&self, id: i64) -> Result<Option<Warehouse>> {
        let sql = format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = $1");
        let warehouse = sqlx::query_as::<_, Warehouse>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(warehouse)
    }

    async fn create(&self, input: &WarehouseInput) -> Result<Warehouse> {
        let sql = format!(
            r#"
            INSERT INTO warehouses (name, address, sub_district_id, phone, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {WAREHOUSE_COLUMNS}
            "#
        );
        let warehouse = sqlx::query_as::<_, Warehouse>(&sql)
            .bind(&input.name)
            .bind(&input.address)
            .bind(input.sub_district_id)
            .bind(&input.phone)
            .bind(input.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(warehouse)
    }

    async fn update(&self, id: i64, input: &WarehouseInput) -> Result<Option<Warehouse>> {
        let sql = format!(
            r#"
            UPDATE warehouses
            SET name = $2, address = $3, sub_district_id = $4, phone = $5,
                is_active = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {WAREHOUSE_COLUMNS}
            "#
        );
        let warehouse = sqlx::query_as::<_, Warehouse>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.address)
            .bind(input.sub_district_id)
            .bind(&input.phone)
            .bind(input.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(warehouse)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM warehouses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn count_products(&self, id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE warehouse_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
