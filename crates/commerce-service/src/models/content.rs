//! 内容：横幅、常见问题、视频、博客文章

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::PublishStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    #[sqlx(default)]
    pub link_url: Option<String>,
    #[sqlx(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub ends_at: Option<DateTime<Utc>>,
    pub urutan: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    /// 当前是否应在前台展示
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.is_none_or(|start| start <= now)
            && self.ends_at.is_none_or(|end| end > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub urutan: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub video_url: String,
    #[sqlx(default)]
    pub thumbnail_url: Option<String>,
    #[sqlx(default)]
    pub description: Option<String>,
    pub urutan: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[sqlx(default)]
    pub excerpt: Option<String>,
    pub body: String,
    #[sqlx(default)]
    pub cover_url: Option<String>,
    pub status: PublishStatus,
    /// 首次发布时写入，之后不再变化
    #[sqlx(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub urutan: i32,
    #[sqlx(default)]
    pub author_admin_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待写入的文章字段
#[derive(Debug, Clone, PartialEq)]
pub struct BlogPostInput {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub cover_url: Option<String>,
    pub status: PublishStatus,
    pub published_at: Option<DateTime<Utc>>,
}
