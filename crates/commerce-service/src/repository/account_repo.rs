//! 账号仓储
//!
//! 管理员与买家的资料维护，密码与登录状态由认证仓储负责

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::AccountRepositoryTrait;
use crate::dto::{AccountFilter, PageRequest};
use crate::error::Result;
use crate::models::{Admin, Buyer};

const ADMIN_COLUMNS: &str =
    "id, username, full_name, email, is_active, last_login_at, created_at, updated_at";

const BUYER_COLUMNS: &str = "id, name, email, phone, company_name, is_active, last_login_at, \
     created_at, updated_at";

pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn keyword_pattern(filter: &AccountFilter) -> Option<String> {
    filter
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| format!("%{}%", k))
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn admin_username_taken(&self, username: &str) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    async fn create_admin(
        &self,
        username: &str,
        password_hash: &str,
        full_name: &str,
        email: Option<String>,
    ) -> Result<Admin> {
        let sql = format!(
            r#"
            INSERT INTO admins (username, password_hash, full_name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING {ADMIN_COLUMNS}
            "#
        );

        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(username)
            .bind(password_hash)
            .bind(full_name)
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(admin)
    }

    async fn get_admin(&self, id: i64) -> Result<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn list_admins(
        &self,
        filter: &AccountFilter,
        page: PageRequest,
    ) -> Result<(Vec<Admin>, i64)> {
        let keyword = keyword_pattern(filter);
        let condition = r#"
            WHERE ($1::text IS NULL OR username ILIKE $1 OR full_name ILIKE $1 OR email ILIKE $1)
              AND ($2::boolean IS NULL OR is_active = $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM admins {condition}"))
            .bind(&keyword)
            .bind(filter.is_active)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {ADMIN_COLUMNS} FROM admins {condition} ORDER BY id ASC LIMIT $3 OFFSET $4"
        );
        let admins = sqlx::query_as::<_, Admin>(&sql)
            .bind(&keyword)
            .bind(filter.is_active)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((admins, total))
    }

    async fn set_admin_active(&self, id: i64, active: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE admins SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn buyer_email_taken(&self, email: &str) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM buyers WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    async fn buyer_phone_taken(&self, phone: &str, exclude_id: Option<i64>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM buyers
                WHERE phone = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(phone)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn create_buyer(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        company_name: Option<String>,
        password_hash: &str,
    ) -> Result<Buyer> {
        let sql = format!(
            r#"
            INSERT INTO buyers (name, email, phone, company_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BUYER_COLUMNS}
            "#
        );

        let buyer = sqlx::query_as::<_, Buyer>(&sql)
            .bind(name)
            .bind(email)
            .bind(phone)
            .bind(company_name)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;

        Ok(buyer)
    }

    async fn get_buyer(&self, id: i64) -> Result<Option<Buyer>> {
        let sql = format!("SELECT {BUYER_COLUMNS} FROM buyers WHERE id = $1");
        let buyer = sqlx::query_as::<_, Buyer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(buyer)
    }

    async fn update_buyer_profile(
        &self,
        id: i64,
        name: &str,
        phone: &str,
        company_name: Option<String>,
    ) -> Result<Option<Buyer>> {
        let sql = format!(
            r#"
            UPDATE buyers
            SET name = $2, phone = $3, company_name = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {BUYER_COLUMNS}
            "#
        );

        let buyer = sqlx::query_as::<_, Buyer>(&sql)
            .bind(id)
            .bind(name)
            .bind(phone)
            .bind(company_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(buyer)
    }

    async fn list_buyers(
        &self,
        filter: &AccountFilter,
        page: PageRequest,
    ) -> Result<(Vec<Buyer>, i64)> {
        let keyword = keyword_pattern(filter);
        let condition = r#"
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1
                   OR phone ILIKE $1 OR company_name ILIKE $1)
              AND ($2::boolean IS NULL OR is_active = $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM buyers {condition}"))
            .bind(&keyword)
            .bind(filter.is_active)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {BUYER_COLUMNS} FROM buyers {condition} \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        );
        let buyers = sqlx::query_as::<_, Buyer>(&sql)
            .bind(&keyword)
            .bind(filter.is_active)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((buyers, total))
    }

    async fn set_buyer_active(&self, id: i64, active: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE buyers SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}
