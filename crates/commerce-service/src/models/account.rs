//! 账号与会话实体
//!
//! Admin 与 Buyer 分表存储，会话表同样分开

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 后台管理员
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    #[sqlx(default)]
    pub email: Option<String>,
    pub is_active: bool,
    #[sqlx(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 买家（批发客户）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[sqlx(default)]
    pub company_name: Option<String>,
    pub is_active: bool,
    #[sqlx(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 登录凭证
///
/// 两类主体查询时统一映射为该结构：login 为用户名（Admin）或邮箱（Buyer）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Credential {
    pub id: i64,
    pub login: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl Credential {
    /// 当前是否处于锁定期
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

/// 登录会话
///
/// 仅保存 Refresh Token 的 SHA-256 摘要
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    pub principal_id: i64,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}
