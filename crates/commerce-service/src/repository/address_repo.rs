//! 收货地址仓储
//!
//! 默认地址的唯一性由部分唯一索引兜底，切换默认地址总在同一事务内先清后设

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::traits::AddressRepositoryTrait;
use crate::error::Result;
use crate::models::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = "id, buyer_id, label, recipient_name, phone, street, \
     sub_district_id, postal_code, notes, is_default, created_at, updated_at";

pub struct AddressRepository {
    pool: PgPool,
}

impl AddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn clear_default(
        tx: &mut Transaction<'_, Postgres>,
        buyer_id: i64,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE addresses SET is_default = false, updated_at = NOW() \
             WHERE buyer_id = $1 AND is_default",
        )
        .bind(buyer_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AddressRepositoryTrait for AddressRepository {
    async fn list_by_buyer(&self, buyer_id: i64) -> Result<Vec<Address>> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE buyer_id = $1 \
             ORDER BY is_default DESC, created_at DESC, id DESC"
        );
        let addresses = sqlx::query_as::<_, Address>(&sql)
            .bind(buyer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(addresses)
    }

    async fn count_by_buyer(&self, buyer_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE buyer_id = $1")
            .bind(buyer_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn get(&self, buyer_id: i64, id: i64) -> Result<Option<Address>> {
        let sql =
            format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND buyer_id = $2");
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(buyer_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(address)
    }

    async fn create(
        &self,
        buyer_id: i64,
        input: &AddressInput,
        make_default: bool,
    ) -> Result<Address> {
        let mut tx = self.pool.begin().await?;

        if make_default {
            Self::clear_default(&mut tx, buyer_id).await?;
        }

        let sql = format!(
            r#"
            INSERT INTO addresses (buyer_id, label, recipient_name, phone, street,
                                   sub_district_id, postal_code, notes, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ADDRESS_COLUMNS}
            "#
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(buyer_id)
            .bind(&input.label)
            .bind(&input.recipient_name)
            .bind(&input.phone)
            .bind(&input.street)
            .bind(input.sub_district_id)
            .bind(&input.postal_code)
            .bind(&input.notes)
            .bind(make_default)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(address)
    }

    async fn update(
        &self,
        buyer_id: i64,
        id: i64,
        input: &AddressInput,
        make_default: bool,
    ) -> Result<Option<Address>> {
        let mut tx = self.pool.begin().await?;

        if make_default {
            Self::clear_default(&mut tx, buyer_id).await?;
        }

        // make_default 为 false 时保留原默认标记
        let sql = format!(
            r#"
            UPDATE addresses
            SET label = $3, recipient_name = $4, phone = $5, street = $6,
                sub_district_id = $7, postal_code = $8, notes = $9,
                is_default = is_default OR $10, updated_at = NOW()
            WHERE id = $1 AND buyer_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "#
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(buyer_id)
            .bind(&input.label)
            .bind(&input.recipient_name)
            .bind(&input.phone)
            .bind(&input.street)
            .bind(input.sub_district_id)
            .bind(&input.postal_code)
            .bind(&input.notes)
            .bind(make_default)
            .fetch_optional(&mut *tx)
            .await?;

        if address.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(address)
    }

    async fn set_default(&self, buyer_id: i64, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM addresses WHERE id = $1 AND buyer_id = $2)",
        )
        .bind(id)
        .bind(buyer_id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            tx.rollback().await?;
            return Ok(false);
        }

        Self::clear_default(&mut tx, buyer_id).await?;

        sqlx::query("UPDATE addresses SET is_default = true, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, buyer_id: i64, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let was_default: Option<bool> = sqlx::query_scalar(
            "DELETE FROM addresses WHERE id = $1 AND buyer_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(buyer_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(was_default) = was_default else {
            tx.rollback().await?;
            return Ok(false);
        };

        if was_default {
            sqlx::query(
                r#"
                UPDATE addresses SET is_default = true, updated_at = NOW()
                WHERE id = (
                    SELECT id FROM addresses WHERE buyer_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT 1
                )
                "#,
            )
            .bind(buyer_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
