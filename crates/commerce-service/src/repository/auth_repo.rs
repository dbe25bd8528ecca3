//! 认证仓储
//!
//! Admin 与 Buyer 的凭证、会话分表存储，SQL 中的表名只来自本模块的常量映射

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::{CredentialRepositoryTrait, SessionRepositoryTrait};
use crate::dto::ClientInfo;
use crate::error::Result;
use crate::models::{Credential, PrincipalKind, Session};

/// 凭证表与登录列
fn credential_source(kind: PrincipalKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        PrincipalKind::Admin => ("admins", "username", "full_name"),
        PrincipalKind::Buyer => ("buyers", "email", "name"),
    }
}

/// 会话表与外键列
fn session_source(kind: PrincipalKind) -> (&'static str, &'static str) {
    match kind {
        PrincipalKind::Admin => ("admin_sessions", "admin_id"),
        PrincipalKind::Buyer => ("buyer_sessions", "buyer_id"),
    }
}

/// 认证仓储
pub struct AuthRepository {
    pool: PgPool,
}

impl AuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn credential_select(kind: PrincipalKind) -> String {
        let (table, login, display) = credential_source(kind);
        format!(
            r#"
            SELECT id, {login} AS login, {display} AS display_name, password_hash,
                   is_active, failed_login_attempts, locked_until
            FROM {table}
            "#
        )
    }

    fn session_select(kind: PrincipalKind) -> String {
        let (table, fk) = session_source(kind);
        format!(
            r#"
            SELECT id, {fk} AS principal_id, expires_at, revoked_at, created_at, last_used_at
            FROM {table}
            "#
        )
    }
}

#[async_trait]
impl CredentialRepositoryTrait for AuthRepository {
    async fn find_credential(
        &self,
        kind: PrincipalKind,
        login: &str,
    ) -> Result<Option<Credential>> {
        let (_, login_column, _) = credential_source(kind);
        let sql = format!(
            "{} WHERE {} = $1",
            Self::credential_select(kind),
            login_column
        );

        let credential = sqlx::query_as::<_, Credential>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;

        Ok(credential)
    }

    async fn find_credential_by_id(
        &self,
        kind: PrincipalKind,
        id: i64,
    ) -> Result<Option<Credential>> {
        let sql = format!("{} WHERE id = $1", Self::credential_select(kind));

        let credential = sqlx::query_as::<_, Credential>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(credential)
    }

    async fn record_login_failure(
        &self,
        kind: PrincipalKind,
        id: i64,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let (table, _, _) = credential_source(kind);
        let sql = format!(
            r#"
            UPDATE {table}
            SET failed_login_attempts = $2, locked_until = $3, updated_at = NOW()
            WHERE id = $1
            "#
        );

        sqlx::query(&sql)
            .bind(id)
            .bind(attempts)
            .bind(locked_until)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_login_success(&self, kind: PrincipalKind, id: i64) -> Result<()> {
        let (table, _, _) = credential_source(kind);
        let sql = format!(
            r#"
            UPDATE {table}
            SET failed_login_attempts = 0, locked_until = NULL,
                last_login_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#
        );

        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn update_password_hash(&self, kind: PrincipalKind, id: i64, hash: &str) -> Result<()> {
        let (table, _, _) = credential_source(kind);
        let sql = format!(
            "UPDATE {table} SET password_hash = $2, updated_at = NOW() WHERE id = $1"
        );

        sqlx::query(&sql)
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl SessionRepositoryTrait for AuthRepository {
    async fn create_session(
        &self,
        kind: PrincipalKind,
        principal_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        client: &ClientInfo,
    ) -> Result<i64> {
        let (table, fk) = session_source(kind);
        let sql = format!(
            r#"
            INSERT INTO {table} ({fk}, refresh_token_hash, user_agent, ip_address, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#
        );

        let id: i64 = sqlx::query_scalar(&sql)
            .bind(principal_id)
            .bind(token_hash)
            .bind(&client.user_agent)
            .bind(&client.ip_address)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(id)
    }

    async fn find_by_token_hash(
        &self,
        kind: PrincipalKind,
        token_hash: &str,
    ) -> Result<Option<Session>> {
        let sql = format!(
            "{} WHERE refresh_token_hash = $1",
            Self::session_select(kind)
        );

        let session = sqlx::query_as::<_, Session>(&sql)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    async fn find_session(&self, kind: PrincipalKind, id: i64) -> Result<Option<Session>> {
        let sql = format!("{} WHERE id = $1", Self::session_select(kind));

        let session = sqlx::query_as::<_, Session>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    async fn rotate(
        &self,
        kind: PrincipalKind,
        id: i64,
        old_hash: &str,
        new_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let (table, _) = session_source(kind);
        // 旧摘要作为条件，防止同一个 Refresh Token 被并发使用两次
        let sql = format!(
            r#"
            UPDATE {table}
            SET refresh_token_hash = $3, expires_at = $4, last_used_at = NOW()
            WHERE id = $1 AND refresh_token_hash = $2
              AND revoked_at IS NULL AND expires_at > NOW()
            "#
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(old_hash)
            .bind(new_hash)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(&self, kind: PrincipalKind, id: i64) -> Result<()> {
        let (table, _) = session_source(kind);
        let sql = format!(
            "UPDATE {table} SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL"
        );

        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn revoke_all_except(
        &self,
        kind: PrincipalKind,
        principal_id: i64,
        keep_session_id: Option<i64>,
    ) -> Result<u64> {
        let (table, fk) = session_source(kind);
        let sql = format!(
            r#"
            UPDATE {table}
            SET revoked_at = NOW()
            WHERE {fk} = $1 AND revoked_at IS NULL
              AND ($2::BIGINT IS NULL OR id <> $2)
            "#
        );

        let result = sqlx::query(&sql)
            .bind(principal_id)
            .bind(keep_session_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_select_per_kind() {
        let admin = AuthRepository::credential_select(PrincipalKind::Admin);
        assert!(admin.contains("username AS login"));
        assert!(admin.contains("FROM admins"));

        let buyer = AuthRepository::credential_select(PrincipalKind::Buyer);
        assert!(buyer.contains("email AS login"));
        assert!(buyer.contains("name AS display_name"));
    }

    #[test]
    fn test_session_select_per_kind() {
        let sql = AuthRepository::session_select(PrincipalKind::Buyer);
        assert!(sql.contains("buyer_id AS principal_id"));
        assert!(sql.contains("FROM buyer_sessions"));
    }
}
